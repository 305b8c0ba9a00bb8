use core::{
    any::{Any, TypeId},
    future::Future,
};
use std::collections::HashMap;

use futures::channel::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};
use log::debug;
use parking_lot::RwLock;
use tokio::sync::broadcast::{self, Receiver, Sender};

use crate::{Error, Route, Topic};

/// Number of payloads a topic buffers for its slowest subscriber.
pub const DEFAULT_TOPIC_CAPACITY: usize = 64;

type Channels = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// A request received on route `R` along with the means to answer it.
pub struct Envelope<R: Route> {
    pub request: R::Request,
    response_tx: oneshot::Sender<R::Response>,
}

impl<R: Route> Envelope<R> {
    pub fn respond(self, response: R::Response) {
        if self.response_tx.send(response).is_err() {
            debug!(
                "response on route {} dropped because the requester stopped waiting",
                R::NAME,
            );
        }
    }
}

/// Channels are created on first use and keyed by the topic or route type.
pub struct Dispatcher {
    topic_capacity: usize,
    topics: RwLock<Channels>,
    routes: RwLock<Channels>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_CAPACITY)
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(topic_capacity: usize) -> Self {
        Self {
            topic_capacity,
            topics: RwLock::default(),
            routes: RwLock::default(),
        }
    }

    /// Sends `payload` to every current subscriber of `T`.
    ///
    /// Returns the number of subscribers the payload was sent to.
    pub fn publish<T: Topic>(&self, payload: T::Payload) -> usize {
        match self.topic_sender::<T>().send(payload) {
            Ok(subscriber_count) => subscriber_count,
            Err(_) => {
                debug!("topic {} has no subscribers", T::NAME);
                0
            }
        }
    }

    /// Subscribes to payloads published on `T` from now on.
    #[must_use]
    pub fn subscribe<T: Topic>(&self) -> Receiver<T::Payload> {
        self.topic_sender::<T>().subscribe()
    }

    /// Makes the caller the receiver of requests sent on `R`.
    ///
    /// A route can be registered again once its previous receiver has been dropped.
    pub fn register_receiver<R: Route>(&self) -> Result<UnboundedReceiver<Envelope<R>>, Error> {
        let mut routes = self.routes.write();

        let registered = routes
            .get(&TypeId::of::<R>())
            .and_then(|channel| channel.downcast_ref::<UnboundedSender<Envelope<R>>>())
            .is_some_and(|request_tx| !request_tx.is_closed());

        if registered {
            return Err(Error::RouteAlreadyRegistered { name: R::NAME });
        }

        let (request_tx, request_rx) = mpsc::unbounded();

        routes.insert(TypeId::of::<R>(), Box::new(request_tx));

        debug!("registered receiver for route {}", R::NAME);

        Ok(request_rx)
    }

    /// Delivers `request` to the receiver of `R`.
    ///
    /// The returned future resolves to the response. Dropping it does not withdraw the request.
    pub fn send_request<R: Route>(
        &self,
        request: R::Request,
    ) -> Result<impl Future<Output = Result<R::Response, Error>> + Send, Error> {
        let name = R::NAME;

        let request_tx = self
            .routes
            .read()
            .get(&TypeId::of::<R>())
            .and_then(|channel| channel.downcast_ref::<UnboundedSender<Envelope<R>>>())
            .cloned()
            .ok_or(Error::RouteNotRegistered { name })?;

        let (response_tx, response_rx) = oneshot::channel();

        request_tx
            .unbounded_send(Envelope {
                request,
                response_tx,
            })
            .map_err(|_| Error::RouteNotRegistered { name })?;

        Ok(async move {
            response_rx
                .await
                .map_err(|_| Error::RequestDropped { name })
        })
    }

    fn topic_sender<T: Topic>(&self) -> Sender<T::Payload> {
        let type_id = TypeId::of::<T>();

        if let Some(sender) = downcast_sender::<T>(&self.topics.read(), type_id) {
            return sender;
        }

        let mut topics = self.topics.write();

        // Another thread may have created the channel between the two locks.
        if let Some(sender) = downcast_sender::<T>(&topics, type_id) {
            return sender;
        }

        let (sender, _) = broadcast::channel(self.topic_capacity);

        topics.insert(type_id, Box::new(sender.clone()));

        sender
    }
}

fn downcast_sender<T: Topic>(topics: &Channels, type_id: TypeId) -> Option<Sender<T::Payload>> {
    topics
        .get(&type_id)
        .and_then(|channel| channel.downcast_ref::<Sender<T::Payload>>())
        .cloned()
}
