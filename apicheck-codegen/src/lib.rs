use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote, quote_spanned};
use syn::spanned::Spanned;

/// Turns `async fn name(session: &mut TestSession) -> Result<(), Error>` into
/// a `#[test]` running on its own current-thread runtime.
///
/// `#[apicheck_test(configure)]` calls `configure(&mut SessionConfiguration)`
/// on a default configuration; `#[apicheck_test]` loads it with
/// `SessionConfiguration::from_env()`. The test panics with the error's full
/// message, transcript included.
#[proc_macro_attribute]
pub fn apicheck_test(attrs: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    let args = syn::parse_macro_input!(attrs as syn::AttributeArgs);

    let signature = &input.sig;
    let block = &input.block;
    let attributes = &input.attrs;
    let test_name = &signature.ident;

    if let Err(stream) = validate_signature(signature) {
        return stream.into();
    }

    if args.len() > 1 {
        return quote! {
            compile_error!("Only a configuration function can be passed to the macro");
        }
        .into();
    }

    let configuration = match args.first() {
        None => quote! {
            ::apicheck::SessionConfiguration::from_env()?
        },
        Some(syn::NestedMeta::Meta(syn::Meta::Path(function_path))) => quote! {
            {
                let mut __apicheck_configuration = ::apicheck::SessionConfiguration::new();
                #function_path(&mut __apicheck_configuration);
                __apicheck_configuration
            }
        },
        Some(_) => {
            return quote! {
                compile_error!("The argument should be a configuration function!");
            }
            .into();
        }
    };

    let body_name = format_ident!("__apicheck_{}", test_name);
    let mut body_signature = signature.clone();
    body_signature.ident = body_name.clone();

    let output = quote! {
        #[test]
        #(#attributes)*
        fn #test_name() {
            #body_signature #block

            ::apicheck::telemetry::init();
            let __apicheck_runtime = match ::apicheck::test_runtime() {
                Ok(runtime) => runtime,
                Err(e) => panic!("apicheck Error: {}", e),
            };
            let __apicheck_outcome: ::std::result::Result<(), ::apicheck::Error> =
                __apicheck_runtime.block_on(async {
                    let mut __apicheck_session =
                        ::apicheck::TestSession::start(#configuration).await?;
                    #body_name(&mut __apicheck_session).await
                });

            if let Err(e) = __apicheck_outcome {
                panic!("{}", e);
            }
        }
    };

    TokenStream::from(output)
}

fn validate_signature(signature: &syn::Signature) -> Result<(), proc_macro2::TokenStream> {
    if signature.asyncness.is_none() {
        return Err(spanned_error(
            signature.fn_token.span(),
            "apicheck tests should be async functions",
        ));
    }

    if signature.inputs.len() != 1 {
        return Err(spanned_error(
            signature.inputs.span(),
            "apicheck tests take exactly one `&mut TestSession` argument",
        ));
    }

    Ok(())
}

fn spanned_error(span: Span, message: &str) -> proc_macro2::TokenStream {
    quote_spanned! {span=>
        compile_error!(#message);
    }
}
