/// Event broadcast to every subscriber.
pub trait Topic: 'static {
    const NAME: &'static str;

    type Payload: Clone + Send + 'static;
}

/// Request answered by exactly one receiver.
pub trait Route: 'static {
    const NAME: &'static str;

    type Request: Send + 'static;
    type Response: Send + 'static;
}
