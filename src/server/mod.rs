pub mod connection;
pub mod handlers;
pub mod listener;
pub mod response;

#[cfg(test)]
pub(crate) mod test_support;
