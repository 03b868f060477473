//! Observable - 値ホルダー + 購読者リスト
//!
//! # 学習ポイント
//! - Arc で共有される内部状態（clone しても同じ値を指す）
//! - 通知はロックを外してから同期的に行う（購読者が値を読み直してもデッドロックしない）
//! - 読み取り専用ビュー（ReadOnly / ListView）で書き込み口を型から消す

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 購読の識別子（unsubscribe 用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscribers<E> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> Subscribers<E> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn add(&mut self, callback: Callback<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn snapshot(&self) -> Vec<Callback<E>> {
        self.entries.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn read<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(|e| e.into_inner())
}

fn notify<E>(subscribers: &Mutex<Subscribers<E>>, event: &E) {
    let callbacks = lock(subscribers).snapshot();
    for callback in callbacks {
        callback(event);
    }
}

// ========================================
// Observable<T>
// ========================================

struct ObservableInner<T> {
    value: RwLock<T>,
    subscribers: Mutex<Subscribers<T>>,
}

/// Observable は 1 つの値を保持し、変化したときに購読者へ通知する
///
/// # 使用例
/// ```ignore
/// let progress = Observable::new(false);
/// progress.subscribe(|busy| println!("busy = {busy}"));
/// progress.set(true); // -> "busy = true"
/// progress.set(true); // 値が同じなので通知なし
/// ```
pub struct Observable<T> {
    inner: Arc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(ObservableInner {
                value: RwLock::new(value),
                subscribers: Mutex::new(Subscribers::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        read(&self.inner.value).clone()
    }

    /// clone せずに参照で読む
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&read(&self.inner.value))
    }

    /// 値を置き換える。変化したときだけ通知し、`true` を返す
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = write(&self.inner.value);
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        notify(&self.inner.subscribers, &value);
        true
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        lock(&self.inner.subscribers).add(Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.inner.subscribers).remove(id)
    }

    pub fn read_only(&self) -> ReadOnly<T> {
        ReadOnly {
            source: self.clone(),
        }
    }
}

/// ReadOnly は Observable の読み取り専用ビュー
pub struct ReadOnly<T> {
    source: Observable<T>,
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ReadOnly<T> {
    pub fn get(&self) -> T {
        self.source.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        self.source.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.source.unsubscribe(id)
    }
}

// ========================================
// ObservableList<T>
// ========================================

/// リストの変更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<T> {
    /// `index` から `items` が追加された
    Added { index: usize, items: Vec<T> },
    /// 全要素が `items` に置き換えられた
    Replaced { items: Vec<T> },
    /// 全要素が削除された
    Cleared,
}

struct ListInner<T> {
    items: RwLock<Vec<T>>,
    subscribers: Mutex<Subscribers<ListChange<T>>>,
}

/// ObservableList は順序付きリストと変更通知
pub struct ObservableList<T> {
    inner: Arc<ListInner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableList<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ListInner {
                items: RwLock::new(Vec::new()),
                subscribers: Mutex::new(Subscribers::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<T> {
        read(&self.inner.items).clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&read(&self.inner.items))
    }

    pub fn len(&self) -> usize {
        read(&self.inner.items).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.inner.items).is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        read(&self.inner.items).get(index).cloned()
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        read(&self.inner.items).iter().find(|item| predicate(item)).cloned()
    }

    pub fn push(&self, item: T) {
        let index = {
            let mut items = write(&self.inner.items);
            items.push(item.clone());
            items.len() - 1
        };
        notify(
            &self.inner.subscribers,
            &ListChange::Added {
                index,
                items: vec![item],
            },
        );
    }

    pub fn replace_all(&self, items: Vec<T>) {
        {
            let mut current = write(&self.inner.items);
            *current = items.clone();
        }
        notify(&self.inner.subscribers, &ListChange::Replaced { items });
    }

    /// 全削除。すでに空なら何もしない
    pub fn clear(&self) {
        {
            let mut current = write(&self.inner.items);
            if current.is_empty() {
                return;
            }
            current.clear();
        }
        notify(&self.inner.subscribers, &ListChange::Cleared);
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&ListChange<T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        lock(&self.inner.subscribers).add(Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.inner.subscribers).remove(id)
    }

    pub fn read_only(&self) -> ListView<T> {
        ListView {
            source: self.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ObservableList<T> {
    pub fn contains(&self, item: &T) -> bool {
        read(&self.inner.items).contains(item)
    }
}

/// ListView は ObservableList の読み取り専用ビュー
pub struct ListView<T> {
    source: ObservableList<T>,
}

impl<T> Clone for ListView<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ListView<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.source.snapshot()
    }

    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.source.with(f)
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.source.get(index)
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.source.find(predicate)
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&ListChange<T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.source.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.source.unsubscribe(id)
    }
}
