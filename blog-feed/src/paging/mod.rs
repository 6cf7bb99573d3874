//! Инкрементальная подгрузка лент и постраничные таблицы.
//!
//! - [`PageSource`] — адаптер одного эндпоинта, отдающий [`PageResult`];
//! - [`FeedController`] — накопительная лента с явным состоянием и
//!   отбрасыванием устаревших ответов;
//! - [`FeedDriver`] + [`SentinelObserver`] — подгрузка по видимости
//!   sentinel-элемента с запросами в фоновых задачах;
//! - [`PagedTable`] + [`Pager`] — переход по номерам страниц для админки.

mod controller;
mod driver;
mod page;
mod pager;
mod source;
mod trigger;

pub use controller::{FeedController, FeedState, LoadKind, LoadOutcome, PageTicket};
pub use driver::FeedDriver;
pub use page::PageResult;
pub use pager::{PagedTable, Pager};
pub use source::{CommentFeed, HomeFeed, PageSource, SearchFeed, TagFeed, TagList};
pub use trigger::{DEFAULT_VISIBILITY_THRESHOLD, SentinelObserver};
