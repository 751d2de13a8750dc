pub mod error;
pub mod identity;
pub mod page;

pub use error::MarketError;
pub use identity::{AgencyContext, PartyRole};
pub use page::{Page, PageRequest};

pub type MarketResult<T> = Result<T, MarketError>;
