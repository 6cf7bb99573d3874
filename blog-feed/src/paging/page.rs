/// Одна страница ленты в едином для всех эндпоинтов виде.
///
/// Адаптер эндпоинта сам решает, есть ли продолжение: контроллеру не важно,
/// сообщает ли сервер `total` или конец определяется по короткой странице.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    /// Элементы страницы в порядке сервера.
    pub items: Vec<T>,
    /// Общее количество элементов, если эндпоинт его сообщает.
    pub total: Option<u64>,
    /// Есть ли смысл запрашивать следующую страницу.
    pub has_more: bool,
}

impl<T> PageResult<T> {
    /// Строит страницу по окну `offset/limit`, из которого она получена.
    ///
    /// Продолжение есть, только если страница полная и (когда `total` известен)
    /// после неё ещё остаются элементы.
    pub fn from_window(items: Vec<T>, offset: u32, limit: u32, total: Option<u64>) -> Self {
        let returned = items.len() as u64;
        let full_page = returned >= u64::from(limit.max(1));
        let below_total = total.is_none_or(|total| u64::from(offset) + returned < total);

        Self {
            items,
            total,
            has_more: full_page && below_total,
        }
    }

    /// Количество элементов на странице.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Пустая ли страница.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Преобразует элементы, сохраняя признаки продолжения.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }
}
