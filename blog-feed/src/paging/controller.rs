use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::paging::page::PageResult;
use crate::paging::source::PageSource;

/// Состояние ленты.
///
/// Загрузка и исчерпание — взаимоисключающие варианты одного перечисления,
/// поэтому комбинация «грузится и уже кончилась» непредставима.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Ключа нет или первая страница не загружена.
    Idle,
    /// Идёт запрос первой страницы.
    LoadingInitial,
    /// Данные есть, можно догружать.
    Ready,
    /// Идёт запрос следующей страницы.
    LoadingMore,
    /// Сервер больше ничего не отдаст для текущего ключа.
    Exhausted,
}

/// Какой запрос обслуживает тикет.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Первая страница ключа.
    Initial,
    /// Продолжение ленты.
    More,
}

/// Итог попытки загрузки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Запрос не отправлялся: уже грузится, лента исчерпана или ключа нет.
    Skipped,
    /// Страница применена; внутри количество полученных элементов.
    Loaded(usize),
    /// Запрос упал; данные не изменились.
    Failed,
    /// Ответ пришёл для устаревшего поколения ленты и отброшен.
    Stale,
}

/// Разрешение на один запрос страницы.
///
/// Привязан к поколению ленты: после `reset`, смены ключа или размера
/// страницы тикет устаревает, и его ответ не будет записан.
#[derive(Debug, Clone)]
pub struct PageTicket<K> {
    generation: u64,
    kind: LoadKind,
    key: K,
    offset: u32,
    limit: u32,
}

impl<K> PageTicket<K> {
    /// Ключ ресурса.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Смещение запроса.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Размер страницы запроса.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Вид запроса.
    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    /// Поколение ленты, в котором выдан тикет.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Контроллер инкрементальной ленты.
///
/// Держит накопленный список, смещение и состояние; одновременно в полёте
/// не больше одного запроса. Работает в две фазы: `begin_*` синхронно
/// переводит ленту в загрузку и выдаёт тикет, `complete` применяет ответ.
/// `load_initial`/`load_more` делают обе фазы сразу.
pub struct FeedController<S: PageSource> {
    source: Arc<S>,
    limit: u32,
    key: Option<S::Key>,
    items: Vec<S::Item>,
    offset: u32,
    total: Option<u64>,
    state: FeedState,
    generation: u64,
    last_error: Option<String>,
}

impl<S: PageSource> FeedController<S> {
    /// Создаёт пустую ленту. Нулевой размер страницы поднимается до 1.
    pub fn new(source: S, limit: u32) -> Self {
        Self::with_shared(Arc::new(source), limit)
    }

    /// Создаёт ленту над разделяемым источником.
    pub fn with_shared(source: Arc<S>, limit: u32) -> Self {
        Self {
            source,
            limit: limit.max(1),
            key: None,
            items: Vec::new(),
            offset: 0,
            total: None,
            state: FeedState::Idle,
            generation: 0,
            last_error: None,
        }
    }

    /// Источник страниц.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Накопленные элементы в порядке сервера.
    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    /// Сколько элементов уже получено; смещение следующего запроса.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Размер страницы.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Общее количество, если его сообщил сервер.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Текущий ключ ресурса.
    pub fn key(&self) -> Option<&S::Key> {
        self.key.as_ref()
    }

    /// Текущее состояние.
    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Поколение ленты; растёт при каждом сбросе.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Есть ли запрос в полёте.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            FeedState::LoadingInitial | FeedState::LoadingMore
        )
    }

    /// Лента дочитана до конца.
    pub fn is_exhausted(&self) -> bool {
        self.state == FeedState::Exhausted
    }

    /// Можно ли прямо сейчас догрузить страницу.
    pub fn has_more(&self) -> bool {
        self.state == FeedState::Ready
    }

    /// Текст последней ошибки загрузки; очищается при следующем успехе.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Начинает загрузку первой страницы ключа.
    ///
    /// Допустимо из `Idle` либо из любого состояния при смене ключа.
    /// Для того же ключа в другом состоянии возвращает `None`.
    pub fn begin_initial(&mut self, key: S::Key) -> Option<PageTicket<S::Key>> {
        let same_key = self.key.as_ref() == Some(&key);
        if same_key && self.state != FeedState::Idle {
            debug!(key = ?key, state = ?self.state, "initial load skipped: key unchanged");
            return None;
        }

        self.discard();
        self.key = Some(key.clone());
        self.state = FeedState::LoadingInitial;
        Some(self.ticket(LoadKind::Initial, key))
    }

    /// Начинает загрузку следующей страницы.
    ///
    /// `None`, если запрос уже в полёте, лента исчерпана или ключа нет.
    pub fn begin_more(&mut self) -> Option<PageTicket<S::Key>> {
        if self.state != FeedState::Ready {
            return None;
        }
        let key = self.key.clone()?;
        self.state = FeedState::LoadingMore;
        Some(self.ticket(LoadKind::More, key))
    }

    /// Принудительно перечитывает текущий ключ с нуля.
    pub fn begin_reload(&mut self) -> Option<PageTicket<S::Key>> {
        let key = self.key.clone()?;
        self.state = FeedState::Idle;
        self.begin_initial(key)
    }

    /// Применяет результат запроса, выданного по `ticket`.
    pub fn complete(
        &mut self,
        ticket: PageTicket<S::Key>,
        result: ApiResult<PageResult<S::Item>>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation || !self.awaits(ticket.kind) {
            debug!(
                key = ?ticket.key,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "stale feed page discarded"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(page) => {
                let count = page.items.len();
                self.offset = self
                    .offset
                    .saturating_add(u32::try_from(count).unwrap_or(u32::MAX));
                if page.total.is_some() {
                    self.total = page.total;
                }
                self.items.extend(page.items);
                self.state = if page.has_more {
                    FeedState::Ready
                } else {
                    FeedState::Exhausted
                };
                self.last_error = None;
                debug!(
                    key = ?ticket.key,
                    count,
                    offset = self.offset,
                    state = ?self.state,
                    "feed page applied"
                );
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                warn!(
                    key = ?ticket.key,
                    offset = ticket.offset,
                    kind = ?ticket.kind,
                    error = %err,
                    "feed page load failed"
                );
                self.last_error = Some(err.to_string());
                self.state = match ticket.kind {
                    LoadKind::Initial => {
                        self.items.clear();
                        self.offset = 0;
                        self.total = None;
                        FeedState::Idle
                    }
                    LoadKind::More => FeedState::Ready,
                };
                LoadOutcome::Failed
            }
        }
    }

    /// Загружает первую страницу ключа.
    pub async fn load_initial(&mut self, key: S::Key) -> LoadOutcome {
        match self.begin_initial(key) {
            Some(ticket) => self.dispatch(ticket).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// Догружает следующую страницу.
    pub async fn load_more(&mut self) -> LoadOutcome {
        match self.begin_more() {
            Some(ticket) => self.dispatch(ticket).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// Перечитывает текущий ключ с нуля.
    pub async fn reload(&mut self) -> LoadOutcome {
        match self.begin_reload() {
            Some(ticket) => self.dispatch(ticket).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// Сбрасывает ленту: уход со страницы. Ответы запросов в полёте будут отброшены.
    pub fn reset(&mut self) {
        self.discard();
        self.key = None;
        self.state = FeedState::Idle;
    }

    /// Меняет размер страницы. Лента сбрасывается, ключ сохраняется для
    /// следующего `load_initial`.
    pub fn set_page_size(&mut self, limit: u32) {
        let limit = limit.max(1);
        if limit == self.limit {
            return;
        }
        self.limit = limit;
        self.discard();
        self.state = FeedState::Idle;
    }

    async fn dispatch(&mut self, ticket: PageTicket<S::Key>) -> LoadOutcome {
        debug!(
            key = ?ticket.key,
            offset = ticket.offset,
            limit = ticket.limit,
            kind = ?ticket.kind,
            "dispatching feed page"
        );
        let result = self
            .source
            .fetch_page(&ticket.key, ticket.offset, ticket.limit)
            .await;
        self.complete(ticket, result)
    }

    fn ticket(&self, kind: LoadKind, key: S::Key) -> PageTicket<S::Key> {
        PageTicket {
            generation: self.generation,
            kind,
            key,
            offset: self.offset,
            limit: self.limit,
        }
    }

    fn awaits(&self, kind: LoadKind) -> bool {
        match kind {
            LoadKind::Initial => self.state == FeedState::LoadingInitial,
            LoadKind::More => self.state == FeedState::LoadingMore,
        }
    }

    fn discard(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.offset = 0;
        self.total = None;
        self.last_error = None;
    }
}
