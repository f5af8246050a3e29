//! HTTP resource surface.
//!
//! Every call goes through [`RequestGateway`], which unwraps the uniform [`Envelope`] and
//! normalizes failures into [`ClientError`](crate::error::ClientError).

mod envelope;
mod gateway;

pub use envelope::{ApiErrorBody, Envelope, EnvelopeStatus};
pub use gateway::{
    RequestGateway, DEFAULT_ACCOUNT_TX_LIMIT, DEFAULT_ACCOUNT_TX_OFFSET,
    DEFAULT_LATEST_BLOCKS_LIMIT, DEFAULT_SEARCH_LIMIT,
};
