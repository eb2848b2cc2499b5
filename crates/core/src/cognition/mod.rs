pub mod response;

pub use response::{AuthorContext, ResponseRequester};
