
#[cfg(test)]
mod smoke_tests;
