use std::future::Future;

use crate::actor::{Actor, Message};
use crate::actor::actor_ref::ActorRef;
use crate::actor::scheduler::SchedulerSender;

pub struct ActorContext<A: Actor> {
    myself: ActorRef<A>,
    scheduler: SchedulerSender,
    pub(crate) stopping: bool,
}

impl<A: Actor> ActorContext<A> {
    pub(crate) fn new(myself: ActorRef<A>, scheduler: SchedulerSender) -> Self {
        Self {
            myself,
            scheduler,
            stopping: false,
        }
    }

    pub fn myself(&self) -> &ActorRef<A> {
        &self.myself
    }

    pub fn scheduler(&self) -> &SchedulerSender {
        &self.scheduler
    }

    /// Stops the actor once the current message has been handled.
    pub fn stop(&mut self) {
        self.stopping = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Runs `future` outside of the actor and delivers its output back to the
    /// mailbox, so slow I/O never blocks message processing.
    pub fn pipe_to_self<F, M>(&self, future: F)
        where
            F: Future<Output=M> + Send + 'static,
            M: Message<A=A>,
    {
        let myself = self.myself.clone();
        tokio::spawn(async move {
            let message = future.await;
            myself.tell(message);
        });
    }
}
