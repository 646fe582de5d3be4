//! Category streams for the mailbox sidebar.
//!
//! Folders and labels are queried separately and joined into one
//! `Vec<CategoryRef>`; the section streams sort and filter that list.

use crate::bridge::Bridge;
use crate::observable::{BoxedObservable, CollectionExt, ObservableExt};
use crate::pool::SubscriptionPool;
use crate::source::ConfigStore;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use rill_core::{Category, CategoryRef, Folder, Label, Model, Query, ResultSet};

/// Configuration key controlling whether `important` is a standard category.
pub const SHOW_IMPORTANT_KEY: &str = "core.workspace.showImportant";

fn scoped<M: Model>(account_id: Option<&str>) -> Query<M> {
    match account_id {
        Some(account_id) => Query::all().where_eq("account_id", account_id),
        None => Query::all(),
    }
}

fn combine(folders: &ResultSet<Folder>, labels: &ResultSet<Label>) -> Vec<CategoryRef> {
    folders
        .iter()
        .map(|folder| Rc::clone(folder) as CategoryRef)
        .chain(labels.iter().map(|label| Rc::clone(label) as CategoryRef))
        .collect()
}

/// Every folder and label across all accounts.
pub fn for_all_accounts(pool: &SubscriptionPool) -> BoxedObservable<Vec<CategoryRef>> {
    for_account(pool, None)
}

/// Every folder and label of one account, or of all accounts for `None`.
pub fn for_account(
    pool: &SubscriptionPool,
    account_id: Option<&str>,
) -> BoxedObservable<Vec<CategoryRef>> {
    let bridge = Bridge::new(pool.clone());
    bridge
        .from_query(scoped::<Folder>(account_id))
        .join(bridge.from_query(scoped::<Label>(account_id)), combine)
        .boxed()
}

/// Standard categories (inbox, sent, trash, ...), sorted.
///
/// Follows the `core.workspace.showImportant` setting: when it flips, the
/// category subscription is rebuilt with the new filter.
pub fn standard<C>(
    pool: &SubscriptionPool,
    config: Rc<C>,
    account_id: Option<&str>,
) -> BoxedObservable<Vec<CategoryRef>>
where
    C: ConfigStore + ?Sized + 'static,
{
    let source = pool.clone();
    let account_id: Option<String> = account_id.map(ToString::to_string);
    Bridge::new(pool.clone())
        .from_config(config, SHOW_IMPORTANT_KEY)
        .switch_map(move |value| {
            let show_important = value.as_bool().unwrap_or(false);
            for_account(&source, account_id.as_deref())
                .sort()
                .filter(move |category: &CategoryRef| category.is_standard_category(show_important))
        })
        .boxed()
}

/// User-created categories, sorted.
pub fn user(pool: &SubscriptionPool, account_id: Option<&str>) -> BoxedObservable<Vec<CategoryRef>> {
    for_account(pool, account_id)
        .sort()
        .filter(|category: &CategoryRef| category.is_user_category())
        .boxed()
}

/// Categories never shown in the user section, sorted.
pub fn hidden(pool: &SubscriptionPool, account_id: Option<&str>) -> BoxedObservable<Vec<CategoryRef>> {
    for_account(pool, account_id)
        .sort()
        .filter(|category: &CategoryRef| category.is_hidden_category())
        .boxed()
}
