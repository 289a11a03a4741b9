//! Order Serializer
//!
//! 任意数量的并发调用方通过 [`OrderSerializer::register_order`] 提交订单，
//! 唯一的 [`OrderWorker`] 按 FIFO 顺序逐个执行，结果通过 oneshot 只返回给提交者。

use super::{CheckedOrder, OrderError, ledger};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

type Reply = oneshot::Sender<Result<i64, OrderError>>;

/// 队列中的一个订单请求
struct OrderJob {
    order: CheckedOrder,
    reply: Reply,
}

/// Submission handle, cheap to clone
#[derive(Clone)]
pub struct OrderSerializer {
    tx: mpsc::Sender<OrderJob>,
    running: Arc<AtomicBool>,
    submit_timeout: Duration,
    capacity: usize,
}

impl OrderSerializer {
    /// Create a handle and its (not yet running) worker
    pub fn new(pool: SqlitePool, capacity: usize, submit_timeout: Duration) -> (Self, OrderWorker) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let running = Arc::new(AtomicBool::new(false));
        let handle = Self {
            tx,
            running: running.clone(),
            submit_timeout,
            capacity,
        };
        let worker = OrderWorker { pool, rx, running };
        (handle, worker)
    }

    /// Whether a worker is currently consuming the queue
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Orders waiting in the queue
    pub fn queued(&self) -> usize {
        self.capacity.saturating_sub(self.tx.capacity())
    }

    /// Register an order and wait for its own outcome
    ///
    /// Fails fast with [`OrderError::WorkerUnavailable`] when no worker runs.
    /// Queue wait plus execution is bounded by the submit timeout; expiry
    /// yields [`OrderError::Timeout`]. Nothing is retried.
    pub async fn register_order(&self, order: CheckedOrder) -> Result<i64, OrderError> {
        if !self.is_running() {
            return Err(OrderError::WorkerUnavailable);
        }

        let (reply, reply_rx) = oneshot::channel();
        let submit = async {
            self.tx
                .send(OrderJob { order, reply })
                .await
                .map_err(|_| OrderError::WorkerUnavailable)?;
            // Worker dropped the job without answering: it stopped
            reply_rx.await.map_err(|_| OrderError::WorkerUnavailable)?
        };

        match tokio::time::timeout(self.submit_timeout, submit).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.submit_timeout, "Order registration timed out");
                Err(OrderError::Timeout(self.submit_timeout))
            }
        }
    }

    /// 定时检查队列积压，超过 3/4 容量时告警
    pub async fn monitor(self, interval: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let queued = self.queued();
                    if !self.is_running() {
                        tracing::warn!(queued, "Order worker is not running");
                    } else if queued * 4 >= self.capacity * 3 {
                        tracing::warn!(queued, capacity = self.capacity, "Order queue is nearly full");
                    } else {
                        tracing::debug!(queued, "Order queue depth");
                    }
                }
            }
        }
    }
}

/// Lowers the running flag when dropped
struct RunningGuard(Arc<AtomicBool>);

impl RunningGuard {
    fn raise(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 订单队列的唯一消费者
pub struct OrderWorker {
    pool: SqlitePool,
    rx: mpsc::Receiver<OrderJob>,
    running: Arc<AtomicBool>,
}

impl OrderWorker {
    /// 返回工作者 future
    ///
    /// The serializer reports "running" from the moment this is called until
    /// the returned future completes, panics or is dropped.
    pub fn run(self, shutdown: CancellationToken) -> impl Future<Output = ()> + Send + 'static {
        let guard = RunningGuard::raise(self.running.clone());
        async move {
            let _guard = guard;
            self.process(shutdown).await;
        }
    }

    async fn process(self, shutdown: CancellationToken) {
        let Self { pool, mut rx, .. } = self;
        tracing::info!("Order worker started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("Order worker received shutdown signal");
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Order channel closed, order worker stopping");
                        break;
                    };
                    handle_job(&pool, job).await;
                }
            }
        }

        // 未处理的请求随接收端一起丢弃，调用方收到 WorkerUnavailable
        rx.close();
    }
}

async fn handle_job(pool: &SqlitePool, job: OrderJob) {
    let OrderJob { order, reply } = job;

    // 调用方已超时离开，不再写入
    if reply.is_closed() {
        tracing::debug!(buyer_id = order.buyer_id(), "Caller gone, skipping queued order");
        return;
    }

    let result = ledger::place_order(pool, &order).await;

    if let Err(result) = reply.send(result) {
        tracing::warn!(
            buyer_id = order.buyer_id(),
            order_id = ?result.ok(),
            "Caller gone before order outcome was delivered"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{dish, kind, order as order_repo, test_db};
    use crate::inventory;
    use shared::models::{DishCreate, DishKindCreate, OrderItem, OrderRequest};

    async fn seed_dish(pool: &SqlitePool, quantity: i64) -> i64 {
        let kind = kind::create(pool, DishKindCreate { repr: "Soup".into(), price: 100 })
            .await
            .unwrap();
        dish::create(
            pool,
            DishCreate {
                name: "Borscht".into(),
                description: String::new(),
                quantity,
                kind: kind.id,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn order(buyer_id: i64, dish_id: i64, quantity: i64) -> CheckedOrder {
        CheckedOrder::new(OrderRequest {
            buyer_id,
            items: vec![OrderItem::new(dish_id, quantity)],
        })
        .unwrap()
    }

    fn start(pool: &SqlitePool) -> (OrderSerializer, CancellationToken, tokio::task::JoinHandle<()>) {
        let (serializer, worker) = OrderSerializer::new(pool.clone(), 64, Duration::from_secs(10));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));
        (serializer, shutdown, handle)
    }

    #[tokio::test]
    async fn test_not_started_fails_fast() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 5).await;
        let (serializer, _worker) = OrderSerializer::new(pool.clone(), 8, Duration::from_secs(30));

        let started = std::time::Instant::now();
        let err = serializer.register_order(order(1, a, 1)).await.unwrap_err();
        assert!(matches!(err, OrderError::WorkerUnavailable));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(inventory::quantity_of(&pool, a).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_stopped_worker_fails_fast() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 5).await;
        let (serializer, shutdown, handle) = start(&pool);
        assert!(serializer.is_running());

        shutdown.cancel();
        handle.await.unwrap();
        assert!(!serializer.is_running());

        let err = serializer.register_order(order(1, a, 1)).await.unwrap_err();
        assert!(matches!(err, OrderError::WorkerUnavailable));
    }

    #[tokio::test]
    async fn test_result_goes_back_to_caller() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 5).await;
        let (serializer, shutdown, _handle) = start(&pool);

        let order_id = serializer.register_order(order(9, a, 2)).await.unwrap();
        let recorded = order_repo::find_by_id(&pool, order_id).await.unwrap().unwrap();
        assert_eq!(recorded.buyer_id, 9);

        let err = serializer.register_order(order(9, a, 4)).await.unwrap_err();
        assert!(matches!(err, OrderError::OutOfStock(id) if id == a));
        let err = serializer.register_order(order(9, 99999, 1)).await.unwrap_err();
        assert!(matches!(err, OrderError::UnknownDish(99999)));

        assert_eq!(inventory::quantity_of(&pool, a).await.unwrap(), 3);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_timed_out_order_is_not_applied() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 5).await;
        let (serializer, worker) = OrderSerializer::new(pool.clone(), 8, Duration::from_millis(300));

        // 工作者已登记为运行但尚未被轮询：请求停在队列里直到超时
        let shutdown = CancellationToken::new();
        let pending = worker.run(shutdown.clone());
        let err = serializer.register_order(order(1, a, 1)).await.unwrap_err();
        assert!(matches!(err, OrderError::Timeout(_)));
        assert!(!err.is_client_fault());

        // 工作者开始运行后跳过被放弃的请求，只处理后续订单
        let handle = tokio::spawn(pending);
        let order_id = serializer.register_order(order(2, a, 2)).await.unwrap();

        assert_eq!(order_repo::count(&pool).await.unwrap(), 1);
        let recorded = order_repo::find_by_id(&pool, order_id).await.unwrap().unwrap();
        assert_eq!(recorded.buyer_id, 2);
        assert_eq!(inventory::quantity_of(&pool, a).await.unwrap(), 3);

        shutdown.cancel();
        handle.await.unwrap();
        assert!(!serializer.is_running());
    }

    #[tokio::test]
    async fn test_dropping_worker_future_lowers_flag() {
        let (_dir, pool) = test_db().await;
        let (serializer, worker) = OrderSerializer::new(pool, 8, Duration::from_secs(1));
        assert!(!serializer.is_running());

        let pending = worker.run(CancellationToken::new());
        assert!(serializer.is_running());
        drop(pending);
        assert!(!serializer.is_running());
    }
}
