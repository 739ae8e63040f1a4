//! Builders and fakes shared by unit and integration tests

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    core::{cmd::HapticKind, error::FetchError},
    domain::{
        CheckoutResponse, DepartmentId, DepartmentSnapshot, ListSnapshot, MutationResponse,
        ProductId, ProductRecord, SearchPage, SearchRequest,
    },
    infrastructure::{catalog_client::CatalogApi, host::HostCapabilities},
};

/// A reservable product with 10 units at 2.00 each
pub fn product(id: i64, department: &str) -> ProductRecord {
    ProductRecord {
        id: ProductId(id),
        article: format!("A-{id}"),
        name: format!("Product {id}"),
        department: DepartmentId::from(department),
        group: None,
        price: 2.0,
        available: 10.0,
        balance_sum: 20.0,
        months_without_movement: 0,
        user_reserved: 0.0,
        user_reserved_sum: 0.0,
        is_different_department: false,
        locked_by_department: None,
    }
}

/// `count` products with consecutive ids starting at `first`
pub fn products(first: i64, count: usize, department: &str) -> Vec<ProductRecord> {
    (first..).take(count).map(|id| product(id, department)).collect()
}

pub fn page(products: Vec<ProductRecord>, has_more: bool) -> SearchPage {
    SearchPage { products, has_more }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not hide the original failure
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
struct ScriptedPage {
    delay: Duration,
    result: Result<SearchPage, FetchError>,
}

#[derive(Debug, Default)]
struct FakeState {
    pages: HashMap<(String, usize), ScriptedPage>,
    search_calls: Vec<SearchRequest>,
    reservations: VecDeque<Result<MutationResponse, FetchError>>,
    reserve_calls: Vec<(ProductId, u32)>,
    update_calls: Vec<(ProductId, u32)>,
    delete_calls: Vec<ProductId>,
    department: Option<DepartmentId>,
    item_count: usize,
    clear_calls: usize,
    checkout_calls: usize,
}

/// Scripted in-memory catalog backend
///
/// Search pages are keyed by query and offset; unknown keys answer with an
/// empty last page. Reservations succeed unless a different answer was queued
/// and add one position to the list; deletions remove one, and the list
/// forgets its department once it is empty. Otherwise the department reported
/// for the list is whatever [`with_list`](Self::with_list) set.
#[derive(Debug, Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, query: &str, offset: usize, page: SearchPage) -> Self {
        self.with_delayed_page(query, offset, Duration::ZERO, page)
    }

    pub fn with_delayed_page(
        self,
        query: &str,
        offset: usize,
        delay: Duration,
        page: SearchPage,
    ) -> Self {
        lock(&self.state).pages.insert(
            (query.to_owned(), offset),
            ScriptedPage {
                delay,
                result: Ok(page),
            },
        );
        self
    }

    pub fn with_failed_page(self, query: &str, offset: usize, error: FetchError) -> Self {
        lock(&self.state).pages.insert(
            (query.to_owned(), offset),
            ScriptedPage {
                delay: Duration::ZERO,
                result: Err(error),
            },
        );
        self
    }

    pub fn with_list(self, department: Option<&str>, item_count: usize) -> Self {
        {
            let mut state = lock(&self.state);
            state.department = department.map(DepartmentId::from);
            state.item_count = item_count;
        }
        self
    }

    pub fn queue_reservation(&self, result: Result<MutationResponse, FetchError>) {
        lock(&self.state).reservations.push_back(result);
    }

    pub fn search_calls(&self) -> Vec<SearchRequest> {
        lock(&self.state).search_calls.clone()
    }

    pub fn reserve_calls(&self) -> Vec<(ProductId, u32)> {
        lock(&self.state).reserve_calls.clone()
    }

    pub fn update_calls(&self) -> Vec<(ProductId, u32)> {
        lock(&self.state).update_calls.clone()
    }

    pub fn delete_calls(&self) -> Vec<ProductId> {
        lock(&self.state).delete_calls.clone()
    }

    pub fn clear_calls(&self) -> usize {
        lock(&self.state).clear_calls
    }

    pub fn checkout_calls(&self) -> usize {
        lock(&self.state).checkout_calls
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, FetchError> {
        let scripted = {
            let mut state = lock(&self.state);
            state.search_calls.push(request.clone());
            state
                .pages
                .get(&(request.query.clone(), request.offset))
                .cloned()
        };
        match scripted {
            Some(scripted) => {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.result
            }
            None => Ok(SearchPage::default()),
        }
    }

    async fn reserve(
        &self,
        _user_id: i64,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<MutationResponse, FetchError> {
        let mut state = lock(&self.state);
        state.reserve_calls.push((product_id, quantity));
        let result = state.reservations.pop_front().unwrap_or_else(|| {
            Ok(MutationResponse {
                success: true,
                message: String::from("Додано до списку"),
            })
        });
        if matches!(&result, Ok(response) if response.success) {
            state.item_count += 1;
        }
        result
    }

    async fn update_item(
        &self,
        _user_id: i64,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<MutationResponse, FetchError> {
        lock(&self.state).update_calls.push((product_id, quantity));
        Ok(MutationResponse {
            success: true,
            message: format!("Кількість оновлено: {quantity} шт."),
        })
    }

    async fn delete_item(
        &self,
        _user_id: i64,
        product_id: ProductId,
    ) -> Result<MutationResponse, FetchError> {
        let mut state = lock(&self.state);
        state.delete_calls.push(product_id);
        state.item_count = state.item_count.saturating_sub(1);
        if state.item_count == 0 {
            state.department = None;
        }
        Ok(MutationResponse {
            success: true,
            message: String::from("Товар видалено"),
        })
    }

    async fn list_snapshot(&self, _user_id: i64) -> Result<ListSnapshot, FetchError> {
        let state = lock(&self.state);
        Ok(ListSnapshot {
            items: Vec::new(),
            total: 0.0,
            count: Some(state.item_count),
        })
    }

    async fn department(&self, _user_id: i64) -> Result<DepartmentSnapshot, FetchError> {
        let state = lock(&self.state);
        Ok(DepartmentSnapshot {
            department: state.department.clone(),
            count: Some(state.item_count),
        })
    }

    async fn clear_list(&self, _user_id: i64) -> Result<MutationResponse, FetchError> {
        let mut state = lock(&self.state);
        state.clear_calls += 1;
        state.department = None;
        state.item_count = 0;
        Ok(MutationResponse {
            success: true,
            message: String::from("Список очищено"),
        })
    }

    async fn checkout(&self, _user_id: i64) -> Result<CheckoutResponse, FetchError> {
        let mut state = lock(&self.state);
        state.checkout_calls += 1;
        state.department = None;
        state.item_count = 0;
        Ok(CheckoutResponse {
            success: true,
            message: String::from("Збережено"),
            cleared: true,
        })
    }
}

#[derive(Debug, Default)]
struct HostLog {
    alerts: Vec<String>,
    haptics: Vec<HapticKind>,
    prompts: Vec<String>,
}

/// Host that records every request and answers confirmations with a fixed value
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Arc<Mutex<HostLog>>,
    confirm_answer: bool,
}

impl RecordingHost {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            log: Arc::default(),
            confirm_answer,
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        lock(&self.log).alerts.clone()
    }

    pub fn haptics(&self) -> Vec<HapticKind> {
        lock(&self.log).haptics.clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.log).prompts.clone()
    }
}

#[async_trait]
impl HostCapabilities for RecordingHost {
    fn alert(&self, message: &str) {
        lock(&self.log).alerts.push(message.to_owned());
    }

    async fn confirm(&self, prompt: &str) -> bool {
        lock(&self.log).prompts.push(prompt.to_owned());
        self.confirm_answer
    }

    fn haptic(&self, kind: HapticKind) {
        lock(&self.log).haptics.push(kind);
    }
}
