pub mod draft;
pub mod gmail;
pub mod provider;
