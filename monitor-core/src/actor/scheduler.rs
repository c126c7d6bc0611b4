use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ahash::{HashMap, HashMapExt};
use futures::StreamExt;
use tokio::select;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::time::delay_queue::{Expired, Key};
use tokio_util::time::DelayQueue;
use tracing::{debug, trace, warn};

enum Schedule {
    Once(Once),
    FixedDelay(FixedDelay),
    Cancel(u64),
    CancelAll,
}

struct Once {
    index: u64,
    delay: Duration,
    block: Box<dyn FnOnce() + Send + 'static>,
}

struct FixedDelay {
    index: u64,
    initial_delay: Option<Duration>,
    interval: Duration,
    block: Box<dyn Fn() + Send + 'static>,
}

struct Scheduler {
    rx: UnboundedReceiver<Schedule>,
    queue: DelayQueue<Schedule>,
    index: HashMap<u64, Key>,
}

impl Scheduler {
    fn run(self) {
        tokio::spawn(async move {
            let Scheduler { mut rx, mut queue, mut index } = self;
            loop {
                select! {
                    Some(schedule) = rx.recv() => {
                        Self::handle_schedule(schedule, &mut queue, &mut index);
                    }
                    Some(expired) = queue.next() => {
                        Self::handle_expired(expired, &mut queue, &mut index);
                    }
                    else => {
                        break;
                    }
                }
            }
            trace!("scheduler exit");
        });
    }

    fn handle_schedule(schedule: Schedule, queue: &mut DelayQueue<Schedule>, index_map: &mut HashMap<u64, Key>) {
        match schedule {
            Schedule::Once(once) => {
                let index = once.index;
                let delay = once.delay;
                let key = queue.insert(Schedule::Once(once), delay);
                trace!("schedule once with index {} after {:?}", index, delay);
                index_map.insert(index, key);
            }
            Schedule::FixedDelay(fixed_delay) => {
                let index = fixed_delay.index;
                let delay = fixed_delay.initial_delay.unwrap_or(fixed_delay.interval);
                let key = queue.insert(Schedule::FixedDelay(fixed_delay), delay);
                trace!("schedule fixed delay with index {} after {:?}", index, delay);
                index_map.insert(index, key);
            }
            Schedule::Cancel(index) => {
                Self::on_cancel(index, queue, index_map);
            }
            Schedule::CancelAll => {
                queue.clear();
                index_map.clear();
            }
        }
    }

    fn on_cancel(index: u64, queue: &mut DelayQueue<Schedule>, index_map: &mut HashMap<u64, Key>) {
        match index_map.remove(&index) {
            None => {
                trace!("cancel a not exists schedule {}", index);
            }
            Some(key) => {
                match queue.try_remove(&key) {
                    None => {
                        warn!("{} already executed, cancel failed", index);
                    }
                    Some(_) => {
                        debug!("{} cancel success", index);
                    }
                }
            }
        }
    }

    fn handle_expired(expired: Expired<Schedule>, queue: &mut DelayQueue<Schedule>, index_map: &mut HashMap<u64, Key>) {
        match expired.into_inner() {
            Schedule::Once(Once { index, delay, block }) => {
                trace!("execute once expired task {} after {:?}", index, delay);
                index_map.remove(&index);
                block();
            }
            Schedule::FixedDelay(FixedDelay { index, interval, block, .. }) => {
                trace!("execute fixed delay expired task {}", index);
                block();
                let next = Schedule::FixedDelay(FixedDelay { index, initial_delay: None, interval, block });
                let next_key = queue.insert(next, interval);
                index_map.insert(index, next_key);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleKey {
    index: u64,
    sender: UnboundedSender<Schedule>,
}

impl ScheduleKey {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn cancel(self) {
        let ScheduleKey { index, sender } = self;
        if sender.send(Schedule::Cancel(index)).is_err() {
            trace!("cancel {} failed, scheduler closed", index);
        }
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Schedule::Once(once) => write!(f, "Once({})", once.index),
            Schedule::FixedDelay(fixed_delay) => write!(f, "FixedDelay({})", fixed_delay.index),
            Schedule::Cancel(index) => write!(f, "Cancel({})", index),
            Schedule::CancelAll => write!(f, "CancelAll"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerSender {
    inner: Arc<Inner>,
}

#[derive(Debug)]
pub struct Inner {
    index: AtomicU64,
    sender: UnboundedSender<Schedule>,
}

impl Deref for SchedulerSender {
    type Target = Arc<Inner>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl SchedulerSender {
    fn next_index(&self) -> u64 {
        self.index.fetch_add(1, Ordering::Relaxed)
    }

    fn key(&self, index: u64) -> ScheduleKey {
        ScheduleKey {
            index,
            sender: self.sender.clone(),
        }
    }

    pub fn schedule_once<F>(&self, delay: Duration, block: F) -> ScheduleKey where F: FnOnce() + Send + 'static {
        let index = self.next_index();
        let schedule = Schedule::Once(Once { index, delay, block: Box::new(block) });
        if self.sender.send(schedule).is_err() {
            warn!("schedule once {} failed, scheduler closed", index);
        }
        self.key(index)
    }

    pub fn schedule_with_fixed_delay<F>(
        &self,
        initial_delay: Option<Duration>,
        interval: Duration,
        block: F,
    ) -> ScheduleKey
        where F: Fn() + Send + 'static,
    {
        let index = self.next_index();
        let schedule = Schedule::FixedDelay(FixedDelay { index, initial_delay, interval, block: Box::new(block) });
        if self.sender.send(schedule).is_err() {
            warn!("schedule fixed delay {} failed, scheduler closed", index);
        }
        self.key(index)
    }

    pub fn cancel_all(&self) {
        if self.sender.send(Schedule::CancelAll).is_err() {
            trace!("cancel all failed, scheduler closed");
        }
    }
}

pub fn scheduler() -> SchedulerSender {
    let (tx, rx) = unbounded_channel();
    let scheduler = Scheduler {
        rx,
        queue: DelayQueue::new(),
        index: HashMap::new(),
    };
    scheduler.run();
    SchedulerSender {
        inner: Arc::new(
            Inner {
                index: AtomicU64::new(0),
                sender: tx,
            }
        )
    }
}
