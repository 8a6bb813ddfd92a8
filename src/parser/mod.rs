pub mod decorators;
pub mod query_parser;

pub use decorators::{
    DecoratedQueryString, PositionMapping, QueryStringDecorator, QueryStringDecorators,
};
pub use query_parser::{ParsedSearch, QueryMetadata, QueryParser};
