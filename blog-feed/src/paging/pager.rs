use std::sync::Arc;

use tracing::warn;

use crate::paging::controller::LoadOutcome;
use crate::paging::source::PageSource;

/// Постраничная навигация по номерам страниц (таблицы админки).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    offset: u32,
    limit: u32,
    total: u64,
}

impl Pager {
    /// Нулевой размер страницы поднимается до 1.
    pub fn new(limit: u32) -> Self {
        Self {
            offset: 0,
            limit: limit.max(1),
            total: 0,
        }
    }

    /// Смещение текущей страницы.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Размер страницы.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Общее количество строк по последнему ответу.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Номер текущей страницы, начиная с 1.
    pub fn current_page(&self) -> u32 {
        self.offset / self.limit + 1
    }

    /// Количество страниц; 0 для пустой таблицы.
    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Смещение страницы с номером `page` (номера меньше 1 считаются первой).
    pub fn offset_for_page(&self, page: u32) -> u32 {
        page.max(1).saturating_sub(1).saturating_mul(self.limit)
    }

    /// Смещение следующей страницы, если она есть.
    pub fn next_offset(&self) -> Option<u32> {
        (self.current_page() < self.total_pages()).then(|| self.offset + self.limit)
    }

    /// Смещение предыдущей страницы, если она есть.
    pub fn prev_offset(&self) -> Option<u32> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }

    /// Фиксирует успешно загруженную страницу.
    pub fn record(&mut self, offset: u32, total: u64) {
        self.offset = offset;
        self.total = total;
    }
}

/// Таблица с переходом по страницам: каждая страница заменяет предыдущую.
///
/// Неудачный переход оставляет прежнюю страницу и позицию.
pub struct PagedTable<S: PageSource> {
    source: Arc<S>,
    key: S::Key,
    pager: Pager,
    rows: Vec<S::Item>,
}

impl<S: PageSource> PagedTable<S> {
    /// Создаёт пустую таблицу для ключа `key`.
    pub fn new(source: S, key: S::Key, limit: u32) -> Self {
        Self {
            source: Arc::new(source),
            key,
            pager: Pager::new(limit),
            rows: Vec::new(),
        }
    }

    /// Строки текущей страницы.
    pub fn rows(&self) -> &[S::Item] {
        &self.rows
    }

    /// Позиция в таблице.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Загружает страницу с номером `page`.
    pub async fn go_to(&mut self, page: u32) -> LoadOutcome {
        let offset = self.pager.offset_for_page(page);
        self.load(offset).await
    }

    /// Следующая страница; `Skipped` на последней.
    pub async fn next(&mut self) -> LoadOutcome {
        match self.pager.next_offset() {
            Some(offset) => self.load(offset).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// Предыдущая страница; `Skipped` на первой.
    pub async fn prev(&mut self) -> LoadOutcome {
        match self.pager.prev_offset() {
            Some(offset) => self.load(offset).await,
            None => LoadOutcome::Skipped,
        }
    }

    async fn load(&mut self, offset: u32) -> LoadOutcome {
        let limit = self.pager.limit();
        match self.source.fetch_page(&self.key, offset, limit).await {
            Ok(page) => {
                let count = page.items.len();
                let total = page
                    .total
                    .unwrap_or(u64::from(offset) + count as u64);
                self.rows = page.items;
                self.pager.record(offset, total);
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                warn!(key = ?self.key, offset, error = %err, "table page load failed");
                LoadOutcome::Failed
            }
        }
    }
}
