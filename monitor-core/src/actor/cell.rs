use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::actor::{Actor, Envelope};
use crate::actor::actor_ref::ActorRef;
use crate::actor::context::ActorContext;
use crate::actor::scheduler::SchedulerSender;

pub fn spawn_actor<A>(name: impl Into<String>, actor: A, scheduler: SchedulerSender) -> (ActorRef<A>, JoinHandle<()>) where A: Actor {
    let name: Arc<str> = Arc::from(name.into());
    let (tx, rx) = unbounded_channel();
    let myself = ActorRef::new(name, tx);
    let context = ActorContext::new(myself.clone(), scheduler);
    let handle = tokio::spawn(run(actor, context, rx));
    (myself, handle)
}

async fn run<A>(mut actor: A, mut context: ActorContext<A>, mut mailbox: UnboundedReceiver<Envelope<A>>) where A: Actor {
    if let Err(error) = actor.started(&mut context).await {
        error!("{} start failed {:?}", context.myself(), error);
    }
    debug!("{} started", context.myself());
    while !context.stopping {
        match mailbox.recv().await {
            Some(Envelope::Message(message)) => {
                trace!("{} handle {:?}", context.myself(), message);
                if let Err(error) = message.handle(&mut context, &mut actor).await {
                    warn!("{} handle message error {:?}", context.myself(), error);
                }
            }
            Some(Envelope::Stop) | None => {
                context.stopping = true;
            }
        }
    }
    mailbox.close();
    if let Err(error) = actor.stopped(&mut context).await {
        error!("{} stop failed {:?}", context.myself(), error);
    }
    debug!("{} stopped", context.myself());
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedSender;

    use crate::actor::{Actor, Message, spawn_actor};
    use crate::actor::context::ActorContext;
    use crate::actor::scheduler::scheduler;

    struct Counter {
        count: usize,
        report: UnboundedSender<usize>,
    }

    #[async_trait]
    impl Actor for Counter {
        async fn stopped(&mut self, _context: &mut ActorContext<Self>) -> anyhow::Result<()> {
            let _ = self.report.send(self.count);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Incr;

    #[async_trait]
    impl Message for Incr {
        type A = Counter;

        async fn handle(self: Box<Self>, _context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()> {
            actor.count += 1;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct SlowIncr;

    #[async_trait]
    impl Message for SlowIncr {
        type A = Counter;

        async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, _actor: &mut Self::A) -> anyhow::Result<()> {
            context.pipe_to_self(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Incr
            });
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Fail;

    #[async_trait]
    impl Message for Fail {
        type A = Counter;

        async fn handle(self: Box<Self>, _context: &mut ActorContext<Self::A>, _actor: &mut Self::A) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    #[tokio::test]
    async fn test_messages_are_handled_in_order_until_stop() -> anyhow::Result<()> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let (actor, handle) = spawn_actor("counter", Counter { count: 0, report: tx }, scheduler());
        actor.tell(Incr);
        actor.tell(Fail);
        actor.tell(Incr);
        actor.tell(SlowIncr);
        tokio::time::sleep(Duration::from_millis(100)).await;
        actor.stop();
        handle.await?;
        assert_eq!(rx.recv().await, Some(3));
        assert!(actor.is_terminated());
        actor.tell(Incr);
        Ok(())
    }
}
