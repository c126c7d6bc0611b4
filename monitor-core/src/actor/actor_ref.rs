use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::actor::{Actor, Envelope, Message};

pub struct ActorRef<A: Actor> {
    name: Arc<str>,
    sender: UnboundedSender<Envelope<A>>,
}

impl<A: Actor> ActorRef<A> {
    pub(crate) fn new(name: Arc<str>, sender: UnboundedSender<Envelope<A>>) -> Self {
        Self { name, sender }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tell<M>(&self, message: M) where M: Message<A=A> {
        if self.sender.send(Envelope::Message(Box::new(message))).is_err() {
            trace!("{} mailbox closed, drop message", self.name);
        }
    }

    /// Asks the actor to stop after the message it is currently handling.
    pub fn stop(&self) {
        if self.sender.send(Envelope::Stop).is_err() {
            trace!("{} already stopped", self.name);
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<A: Actor> Debug for ActorRef<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorRef")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<A: Actor> Display for ActorRef<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Actor[{}]", self.name)
    }
}
