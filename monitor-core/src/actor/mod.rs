use std::fmt::Debug;

use async_trait::async_trait;

use crate::actor::context::ActorContext;

pub mod actor_ref;
pub mod context;
pub mod scheduler;
mod cell;

pub use cell::spawn_actor;

/// A unit of state that processes its mailbox one message at a time. Every
/// mutation of the actor happens inside [`Message::handle`], so the actor is the
/// single writer of its own fields.
#[async_trait]
pub trait Actor: Send + Sized + 'static {
    #[allow(unused_variables)]
    async fn started(&mut self, context: &mut ActorContext<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    #[allow(unused_variables)]
    async fn stopped(&mut self, context: &mut ActorContext<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait Message: Debug + Send + 'static {
    type A: Actor;

    async fn handle(self: Box<Self>, context: &mut ActorContext<Self::A>, actor: &mut Self::A) -> anyhow::Result<()>;
}

pub type DynMessage<A> = Box<dyn Message<A=A>>;

pub(crate) enum Envelope<A: Actor> {
    Message(DynMessage<A>),
    Stop,
}
