//! Domain services the pipeline calls into.
//!
//! Each service is a cheap `Clone` over the shared [`Store`] so rules can
//! move a copy into a fan-out job.  Methods that only touch storage are
//! synchronous and take the store lock for the whole operation.

mod activity;
mod currency;
mod friend;
mod metric;
mod network;
mod notification;
mod post;
mod report;
mod tag;
mod vote;

use std::sync::Arc;

use agora_store::Store;

pub use activity::ActivityLogService;
pub use currency::CurrencyService;
pub use friend::{FriendPlan, FriendService};
pub use metric::MetricService;
pub use network::{CurrencyVerifier, NetworkService, RawCurrency, RpcCurrencyVerifier};
pub use notification::NotificationService;
pub use post::{Importers, PostService};
pub use report::ReportService;
pub use tag::{normalize_tag_id, TagService};
pub use vote::VoteService;

#[derive(Clone)]
pub struct Services {
    pub store: Store,
    pub notification: NotificationService,
    pub activity: ActivityLogService,
    pub metric: MetricService,
    pub currency: CurrencyService,
    pub friend: FriendService,
    pub tag: TagService,
    pub post: PostService,
    pub report: ReportService,
    pub vote: VoteService,
    pub network: NetworkService,
}

impl Services {
    pub fn new(store: Store, verifier: Arc<dyn CurrencyVerifier>) -> Self {
        let metric = MetricService::new(store.clone());
        Self {
            notification: NotificationService::new(store.clone()),
            activity: ActivityLogService::new(store.clone()),
            currency: CurrencyService::new(store.clone()),
            friend: FriendService::new(store.clone()),
            tag: TagService::new(store.clone()),
            post: PostService::new(store.clone()),
            report: ReportService::new(store.clone()),
            vote: VoteService::new(store.clone(), metric.clone()),
            network: NetworkService::new(store.clone(), verifier),
            metric,
            store,
        }
    }
}
