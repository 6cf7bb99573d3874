use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ApiResult;
use crate::paging::controller::{FeedController, LoadOutcome, PageTicket};
use crate::paging::page::PageResult;
use crate::paging::source::PageSource;
use crate::paging::trigger::SentinelObserver;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Результат фонового запроса страницы, возвращённый в цикл событий.
struct FeedEvent<S: PageSource> {
    ticket: PageTicket<S::Key>,
    result: ApiResult<PageResult<S::Item>>,
}

/// Событийный драйвер ленты.
///
/// Запросы уходят в отдельные tokio-задачи, а их результаты применяются
/// только в `settle`, то есть в задаче-владельце ленты. Сигналы видимости
/// sentinel-элемента, пришедшие во время запроса, ничего не отправляют.
pub struct FeedDriver<S: PageSource> {
    controller: FeedController<S>,
    sentinel: SentinelObserver,
    result_tx: mpsc::Sender<FeedEvent<S>>,
    result_rx: mpsc::Receiver<FeedEvent<S>>,
}

impl<S: PageSource> FeedDriver<S> {
    /// Оборачивает контроллер.
    pub fn new(controller: FeedController<S>, sentinel: SentinelObserver) -> Self {
        let (result_tx, result_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            controller,
            sentinel,
            result_tx,
            result_rx,
        }
    }

    /// Текущее состояние ленты.
    pub fn controller(&self) -> &FeedController<S> {
        &self.controller
    }

    /// Открывает ленту для ключа (переход на страницу или смена параметра).
    ///
    /// `true`, если запрос первой страницы отправлен.
    pub fn open(&mut self, key: S::Key) -> bool {
        match self.controller.begin_initial(key) {
            Some(ticket) => {
                self.spawn(ticket);
                true
            }
            None => false,
        }
    }

    /// Сигнал видимости sentinel-элемента с долей `visible_ratio`.
    ///
    /// `true`, если отправлен запрос следующей страницы.
    pub fn on_sentinel(&mut self, visible_ratio: f64) -> bool {
        if !self.sentinel.is_intersecting(visible_ratio) {
            return false;
        }
        match self.controller.begin_more() {
            Some(ticket) => {
                self.spawn(ticket);
                true
            }
            None => {
                debug!(state = ?self.controller.state(), "sentinel visible, load skipped");
                false
            }
        }
    }

    /// Уход со страницы: лента сбрасывается, поздние ответы отбрасываются.
    pub fn close(&mut self) {
        self.controller.reset();
    }

    /// Ждёт завершения текущего запроса и применяет его.
    ///
    /// Устаревшие ответы по пути отбрасываются. `None`, если ждать нечего.
    pub async fn settle(&mut self) -> Option<LoadOutcome> {
        while self.controller.is_loading() {
            let event = self.result_rx.recv().await?;
            let outcome = self.controller.complete(event.ticket, event.result);
            if outcome != LoadOutcome::Stale {
                return Some(outcome);
            }
        }
        None
    }

    /// Отдаёт контроллер, завершая драйвер.
    pub fn into_controller(self) -> FeedController<S> {
        self.controller
    }

    fn spawn(&self, ticket: PageTicket<S::Key>) {
        let source = Arc::clone(self.controller.source());
        let result_tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = source
                .fetch_page(ticket.key(), ticket.offset(), ticket.limit())
                .await;
            if result_tx.send(FeedEvent { ticket, result }).await.is_err() {
                debug!("feed driver dropped, page discarded");
            }
        });
    }
}
