//! Correlated request/response client over a message transport.
//!
//! Every request gets the next integer correlation id and a single-shot
//! resolver in the pending table. Inbound messages are matched by id only, so
//! responses may arrive in any order. Entries leave the table when answered,
//! when they exceed the request timeout, or when the connection closes.

use crate::protocol::{
    AuthenticationRequest, AuthenticationResponse, MessageType, RequestEnvelope,
    ResponseEnvelope, TokenRequest, TokenResponse,
};
use futures::channel::oneshot;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

pub const DEFAULT_REQUEST_TIMEOUT_MS: f32 = 10_000.0;
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Text-message duplex connection. `receive` must not block: it returns
/// `Ok(None)` when nothing is waiting.
pub trait Transport {
    fn send(&mut self, text: &str) -> Result<(), TransportError>;
    fn receive(&mut self) -> Result<Option<String>, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error: {}", self.0)
    }
}

impl Error for TransportError {}

#[derive(Debug, Clone, PartialEq)]
pub enum RpcError {
    NotOpen,
    Closed(String),
    TooManyPending(usize),
    TimedOut { id: u64, kind: MessageType },
    Api { id: u64, message: String },
    Transport(TransportError),
    Encode(String),
    Decode(String),
    Dropped,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::NotOpen => f.write_str("connection is not open yet"),
            RpcError::Closed(reason) => write!(f, "connection closed: {reason}"),
            RpcError::TooManyPending(limit) => {
                write!(f, "too many pending requests (limit {limit})")
            }
            RpcError::TimedOut { id, kind } => write!(f, "request {id} ({kind:?}) timed out"),
            RpcError::Api { id, message } => write!(f, "request {id} rejected: {message}"),
            RpcError::Transport(err) => write!(f, "{err}"),
            RpcError::Encode(err) => write!(f, "failed to encode request: {err}"),
            RpcError::Decode(err) => write!(f, "failed to decode response: {err}"),
            RpcError::Dropped => f.write_str("request was dropped without a response"),
        }
    }
}

impl Error for RpcError {}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        RpcError::Transport(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    NoToken,
    Rejected(String),
    Rpc(RpcError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NoToken => f.write_str("authentication failed: no token issued"),
            AuthError::Rejected(reason) => write!(f, "authentication rejected: {reason}"),
            AuthError::Rpc(err) => write!(f, "authentication failed: {err}"),
        }
    }
}

impl Error for AuthError {}

impl From<RpcError> for AuthError {
    fn from(err: RpcError) -> Self {
        AuthError::Rpc(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestPolicy {
    /// `None` keeps unanswered requests until the connection closes.
    pub timeout_ms: Option<f32>,
    pub max_pending: usize,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginIdentity {
    pub name: String,
    pub developer: String,
}

impl PluginIdentity {
    pub fn new(name: impl Into<String>, developer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            developer: developer.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

type Outcome = Result<Value, RpcError>;

struct PendingRequest {
    kind: MessageType,
    sent_at_ms: f64,
    resolver: oneshot::Sender<Outcome>,
}

/// Completion of one request. The request is already on the wire when this is
/// returned, so dropping it discards only the answer.
#[derive(Debug)]
pub struct PendingResponse {
    id: u64,
    receiver: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RpcError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub struct RpcClient<T> {
    transport: T,
    state: ConnectionState,
    close_reason: String,
    next_id: u64,
    pending: HashMap<u64, PendingRequest>,
    clock_ms: f64,
    policy: RequestPolicy,
    on_open: Option<Box<dyn FnOnce()>>,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T, policy: RequestPolicy) -> Self {
        Self {
            transport,
            state: ConnectionState::Connecting,
            close_reason: String::new(),
            next_id: 0,
            pending: HashMap::new(),
            clock_ms: 0.0,
            policy,
            on_open: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of correlation ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn on_open(&mut self, callback: impl FnOnce() + 'static) {
        self.on_open = Some(Box::new(callback));
    }

    /// Moves to `Open` and hands back the open callback; the caller runs it
    /// after releasing its borrow of the client.
    fn mark_open(&mut self) -> Option<Box<dyn FnOnce()>> {
        if self.state != ConnectionState::Connecting {
            return None;
        }
        self.state = ConnectionState::Open;
        info!("connection open");
        self.on_open.take()
    }

    pub fn request(
        &mut self,
        kind: MessageType,
        data: Option<Value>,
    ) -> Result<PendingResponse, RpcError> {
        self.ensure_open()?;
        if self.pending.len() >= self.policy.max_pending {
            return Err(RpcError::TooManyPending(self.policy.max_pending));
        }

        let id = self.send_envelope(kind, data.as_ref())?;

        let (resolver, receiver) = oneshot::channel();
        self.pending.insert(
            id,
            PendingRequest {
                kind,
                sent_at_ms: self.clock_ms,
                resolver,
            },
        );
        debug!("sent request {id} ({kind:?})");
        Ok(PendingResponse { id, receiver })
    }

    /// Sends a request whose answer nobody waits for. It takes no slot in the
    /// pending table, so it is never refused for capacity; its response is
    /// dropped as unknown.
    pub fn notify(&mut self, kind: MessageType, data: Option<Value>) -> Result<u64, RpcError> {
        self.ensure_open()?;
        let id = self.send_envelope(kind, data.as_ref())?;
        debug!("sent notification {id} ({kind:?})");
        Ok(id)
    }

    fn ensure_open(&self) -> Result<(), RpcError> {
        match self.state {
            ConnectionState::Connecting => Err(RpcError::NotOpen),
            ConnectionState::Closed => Err(RpcError::Closed(self.close_reason.clone())),
            ConnectionState::Open => Ok(()),
        }
    }

    /// Consumes the next correlation id even when encoding or sending fails.
    fn send_envelope(&mut self, kind: MessageType, data: Option<&Value>) -> Result<u64, RpcError> {
        let id = self.next_id;
        self.next_id += 1;

        let envelope = RequestEnvelope::new(id, kind, data);
        let text =
            serde_json::to_string(&envelope).map_err(|err| RpcError::Encode(err.to_string()))?;
        self.transport.send(&text)?;
        Ok(id)
    }

    /// Resolves the matching pending request. Returns `false` when the message
    /// is malformed or answers nothing we are waiting for.
    pub fn handle_message(&mut self, text: &str) -> bool {
        let envelope: ResponseEnvelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!("dropping malformed message: {err}");
                return false;
            }
        };
        let Some(id) = envelope.correlation_id() else {
            debug!("dropping message with request id {:?}", envelope.request_id);
            return false;
        };
        let Some(entry) = self.pending.remove(&id) else {
            debug!("dropping response to unknown request {id}");
            return false;
        };

        let outcome = if envelope.is_api_error() {
            Err(RpcError::Api {
                id,
                message: envelope.error_message(),
            })
        } else {
            Ok(envelope.data)
        };
        // Fire-and-forget callers have already dropped the receiver.
        let _ = entry.resolver.send(outcome);
        debug!("resolved request {id} ({:?})", entry.kind);
        true
    }

    /// Drains the transport. A receive error closes the connection.
    pub fn pump(&mut self) -> usize {
        let mut matched = 0;
        while self.state != ConnectionState::Closed {
            match self.transport.receive() {
                Ok(Some(text)) => {
                    if self.handle_message(&text) {
                        matched += 1;
                    }
                }
                Ok(None) => break,
                Err(err) => self.close(&err.0),
            }
        }
        matched
    }

    pub fn tick(&mut self, delta_ms: f32) {
        // Also rejects NaN, which would stop the clock for good.
        if !(delta_ms >= 0.0) {
            return;
        }
        self.clock_ms += f64::from(delta_ms);

        let Some(timeout_ms) = self.policy.timeout_ms else {
            return;
        };
        let now = self.clock_ms;
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, entry)| now - entry.sent_at_ms >= f64::from(timeout_ms))
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            if let Some(entry) = self.pending.remove(&id) {
                warn!("request {id} ({:?}) timed out", entry.kind);
                let _ = entry.resolver.send(Err(RpcError::TimedOut {
                    id,
                    kind: entry.kind,
                }));
            }
        }
    }

    pub fn close(&mut self, reason: &str) {
        if self.state == ConnectionState::Closed {
            return;
        }
        warn!("connection closed: {reason}");
        self.state = ConnectionState::Closed;
        self.close_reason = reason.to_string();
        self.on_open = None;
        for (_, entry) in self.pending.drain() {
            let _ = entry.resolver.send(Err(RpcError::Closed(reason.to_string())));
        }
    }
}

pub(crate) fn to_payload<S: Serialize>(payload: &S) -> Result<Value, RpcError> {
    serde_json::to_value(payload).map_err(|err| RpcError::Encode(err.to_string()))
}

/// Shared handle to a client for single-threaded use; clones refer to the
/// same connection.
pub struct VtsLink<T> {
    client: Rc<RefCell<RpcClient<T>>>,
}

impl<T> Clone for VtsLink<T> {
    fn clone(&self) -> Self {
        Self {
            client: Rc::clone(&self.client),
        }
    }
}

impl<T: Transport> VtsLink<T> {
    pub fn new(client: RpcClient<T>) -> Self {
        Self {
            client: Rc::new(RefCell::new(client)),
        }
    }

    /// Registers the ready callback. If the connection is already open the
    /// callback runs immediately.
    pub fn on_open(&self, callback: impl FnOnce() + 'static) {
        let already_open = self.client.borrow().state() == ConnectionState::Open;
        if already_open {
            callback();
        } else {
            self.client.borrow_mut().on_open(callback);
        }
    }

    pub fn open(&self) {
        let callback = self.client.borrow_mut().mark_open();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.client.borrow().state()
    }

    pub fn pending_count(&self) -> usize {
        self.client.borrow().pending_count()
    }

    pub fn request(
        &self,
        kind: MessageType,
        data: Option<Value>,
    ) -> Result<PendingResponse, RpcError> {
        self.client.borrow_mut().request(kind, data)
    }

    /// Sends a request and decodes its payload. An absent payload decodes as
    /// an empty object.
    pub async fn call<R: DeserializeOwned>(
        &self,
        kind: MessageType,
        data: Option<Value>,
    ) -> Result<R, RpcError> {
        let value = self.request(kind, data)?.await?;
        let value = if value.is_null() {
            Value::Object(Default::default())
        } else {
            value
        };
        serde_json::from_value(value).map_err(|err| RpcError::Decode(err.to_string()))
    }

    pub fn notify(&self, kind: MessageType, data: Option<Value>) -> Result<u64, RpcError> {
        self.client.borrow_mut().notify(kind, data)
    }

    pub fn pump(&self) -> usize {
        self.client.borrow_mut().pump()
    }

    pub fn tick(&self, delta_ms: f32) {
        self.client.borrow_mut().tick(delta_ms);
    }

    pub fn close(&self, reason: &str) {
        self.client.borrow_mut().close(reason);
    }

    pub fn with_client<R>(&self, f: impl FnOnce(&mut RpcClient<T>) -> R) -> R {
        f(&mut self.client.borrow_mut())
    }

    /// Token request followed by the session authentication request. Without
    /// a token the second request is never sent.
    pub async fn authorize(&self, identity: &PluginIdentity) -> Result<(), AuthError> {
        let token_request = to_payload(&TokenRequest {
            plugin_name: &identity.name,
            plugin_developer: &identity.developer,
        })?;
        let response: TokenResponse = self
            .call(MessageType::AuthenticationTokenRequest, Some(token_request))
            .await?;
        let Some(token) = response
            .authentication_token
            .filter(|token| !token.is_empty())
        else {
            error!("authentication failed: token request returned no token");
            return Err(AuthError::NoToken);
        };

        let auth_request = to_payload(&AuthenticationRequest {
            plugin_name: &identity.name,
            plugin_developer: &identity.developer,
            authentication_token: &token,
        })?;
        let response: AuthenticationResponse = self
            .call(MessageType::AuthenticationRequest, Some(auth_request))
            .await?;
        if !response.authenticated {
            error!("authentication rejected: {}", response.reason);
            return Err(AuthError::Rejected(response.reason));
        }

        info!("authenticated as {} by {}", identity.name, identity.developer);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use serde_json::json;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub(crate) struct Loopback {
        pub sent: Vec<String>,
        pub inbound: VecDeque<String>,
        pub fail_receive: bool,
    }

    impl Loopback {
        pub fn sent_json(&self, index: usize) -> Value {
            serde_json::from_str(&self.sent[index]).unwrap()
        }
    }

    impl Transport for Loopback {
        fn send(&mut self, text: &str) -> Result<(), TransportError> {
            self.sent.push(text.to_string());
            Ok(())
        }

        fn receive(&mut self) -> Result<Option<String>, TransportError> {
            if self.fail_receive {
                return Err(TransportError::new("socket reset"));
            }
            Ok(self.inbound.pop_front())
        }
    }

    pub(crate) fn response(id: u64, data: Value) -> String {
        json!({
            "apiName": "VTubeStudioPublicAPI",
            "apiVersion": "1.0",
            "timestamp": 1,
            "requestID": id.to_string(),
            "messageType": "Response",
            "data": data,
        })
        .to_string()
    }

    fn open_client(policy: RequestPolicy) -> RpcClient<Loopback> {
        let mut client = RpcClient::new(Loopback::default(), policy);
        assert!(client.mark_open().is_none());
        client
    }

    #[test]
    fn requests_before_open_are_refused() {
        let mut client = RpcClient::new(Loopback::default(), RequestPolicy::default());
        let err = client
            .request(MessageType::CurrentModelRequest, None)
            .unwrap_err();
        assert_eq!(err, RpcError::NotOpen);
        assert!(client.transport().sent.is_empty());
        assert_eq!(client.issued(), 0);
    }

    #[test]
    fn open_callback_fires_once() {
        let link = VtsLink::new(RpcClient::new(Loopback::default(), RequestPolicy::default()));
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        link.on_open(move || *counter.borrow_mut() += 1);

        link.open();
        link.open();

        assert_eq!(*calls.borrow(), 1);
        assert_eq!(link.state(), ConnectionState::Open);
    }

    #[test]
    fn correlation_ids_count_up_from_zero() {
        let mut client = open_client(RequestPolicy::default());
        for _ in 0..5 {
            client.request(MessageType::CurrentModelRequest, None).unwrap();
        }

        let ids: Vec<Value> = (0..5)
            .map(|index| client.transport().sent_json(index)["requestID"].clone())
            .collect();
        assert_eq!(ids, vec![json!("0"), json!("1"), json!("2"), json!("3"), json!("4")]);
        assert_eq!(client.pending_count(), 5);
    }

    #[test]
    fn envelope_carries_api_identity() {
        let mut client = open_client(RequestPolicy::default());
        client
            .request(MessageType::MoveModelRequest, Some(json!({ "size": 1.0 })))
            .unwrap();
        let sent = client.transport().sent_json(0);
        assert_eq!(sent["apiName"], "VTubeStudioPublicAPI");
        assert_eq!(sent["apiVersion"], "1.0");
        assert_eq!(sent["messageType"], "MoveModelRequest");
        assert_eq!(sent["data"]["size"], 1.0);
    }

    #[test]
    fn out_of_order_responses_reach_their_own_callers() {
        let mut client = open_client(RequestPolicy::default());
        let first = client.request(MessageType::CurrentModelRequest, None).unwrap();
        let second = client.request(MessageType::CurrentModelRequest, None).unwrap();

        assert!(client.handle_message(&response(1, json!({ "answer": "second" }))));
        assert!(client.handle_message(&response(0, json!({ "answer": "first" }))));

        assert_eq!(block_on(first).unwrap(), json!({ "answer": "first" }));
        assert_eq!(block_on(second).unwrap(), json!({ "answer": "second" }));
        assert_eq!(client.pending_count(), 0);
    }

    #[test]
    fn each_request_resolves_at_most_once() {
        let mut client = open_client(RequestPolicy::default());
        let pending = client.request(MessageType::CurrentModelRequest, None).unwrap();

        assert!(client.handle_message(&response(0, json!({ "n": 1 }))));
        assert!(!client.handle_message(&response(0, json!({ "n": 2 }))));
        assert_eq!(block_on(pending).unwrap(), json!({ "n": 1 }));
    }

    #[test]
    fn unmatched_and_malformed_messages_are_dropped() {
        let mut client = open_client(RequestPolicy::default());
        client.request(MessageType::CurrentModelRequest, None).unwrap();

        assert!(!client.handle_message("not json"));
        assert!(!client.handle_message(r#"{"data":{}}"#));
        assert!(!client.handle_message(r#"{"requestID":"abc"}"#));
        assert!(!client.handle_message(&response(42, json!({}))));
        assert_eq!(client.pending_count(), 1);
    }

    #[test]
    fn api_errors_fail_the_request() {
        let mut client = open_client(RequestPolicy::default());
        let pending = client.request(MessageType::CurrentModelRequest, None).unwrap();
        client.handle_message(
            &json!({
                "requestID": "0",
                "messageType": "APIError",
                "data": { "errorID": 8, "message": "plugin not authenticated" },
            })
            .to_string(),
        );

        assert_eq!(
            block_on(pending).unwrap_err(),
            RpcError::Api {
                id: 0,
                message: "plugin not authenticated".to_string()
            }
        );
    }

    #[test]
    fn dropped_futures_still_drain_the_table() {
        let mut client = open_client(RequestPolicy::default());
        drop(client.request(MessageType::MoveModelRequest, None).unwrap());
        assert_eq!(client.pending_count(), 1);

        assert!(client.handle_message(&response(0, json!({}))));
        assert_eq!(client.pending_count(), 0);
    }

    #[test]
    fn pump_drains_inbound_queue() {
        let mut client = open_client(RequestPolicy::default());
        let pending = client.request(MessageType::CurrentModelRequest, None).unwrap();
        client.transport_mut().inbound.push_back("garbage".to_string());
        client
            .transport_mut()
            .inbound
            .push_back(response(0, json!({ "ok": true })));

        assert_eq!(client.pump(), 1);
        assert!(client.transport().inbound.is_empty());
        assert_eq!(block_on(pending).unwrap(), json!({ "ok": true }));
    }

    #[test]
    fn requests_expire_after_timeout() {
        let mut client = open_client(RequestPolicy {
            timeout_ms: Some(100.0),
            max_pending: 8,
        });
        let pending = client.request(MessageType::CurrentModelRequest, None).unwrap();

        client.tick(60.0);
        assert_eq!(client.pending_count(), 1);
        client.tick(-500.0);
        assert_eq!(client.pending_count(), 1);
        client.tick(40.0);
        assert_eq!(client.pending_count(), 0);

        assert_eq!(
            block_on(pending).unwrap_err(),
            RpcError::TimedOut {
                id: 0,
                kind: MessageType::CurrentModelRequest
            }
        );
        // A late answer is ignored.
        assert!(!client.handle_message(&response(0, json!({}))));
    }

    #[test]
    fn nan_tick_leaves_the_clock_running() {
        let mut client = open_client(RequestPolicy {
            timeout_ms: Some(100.0),
            max_pending: 8,
        });
        client.tick(f32::NAN);
        let pending = client.request(MessageType::CurrentModelRequest, None).unwrap();

        client.tick(f32::NAN);
        assert_eq!(client.pending_count(), 1);
        client.tick(100.0);
        assert_eq!(client.pending_count(), 0);
        assert!(matches!(
            block_on(pending).unwrap_err(),
            RpcError::TimedOut { id: 0, .. }
        ));
    }

    #[test]
    fn notifications_bypass_the_pending_table() {
        let mut client = open_client(RequestPolicy {
            timeout_ms: None,
            max_pending: 1,
        });
        client.request(MessageType::CurrentModelRequest, None).unwrap();
        assert_eq!(
            client
                .request(MessageType::MoveModelRequest, None)
                .unwrap_err(),
            RpcError::TooManyPending(1)
        );

        let id = client
            .notify(MessageType::MoveModelRequest, Some(json!({ "size": 5.0 })))
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(client.pending_count(), 1);
        let sent = client.transport().sent_json(1);
        assert_eq!(sent["requestID"], "2");
        assert_eq!(sent["messageType"], "MoveModelRequest");
        assert_eq!(sent["data"]["size"], 5.0);

        // The answer matches nothing and is dropped.
        assert!(!client.handle_message(&response(2, json!({}))));
        assert_eq!(client.pending_count(), 1);
    }

    #[test]
    fn notifications_need_an_open_connection() {
        let mut client = RpcClient::new(Loopback::default(), RequestPolicy::default());
        assert_eq!(
            client.notify(MessageType::MoveModelRequest, None).unwrap_err(),
            RpcError::NotOpen
        );
        client.close("gone");
        assert_eq!(
            client.notify(MessageType::MoveModelRequest, None).unwrap_err(),
            RpcError::Closed("gone".to_string())
        );
        assert!(client.transport().sent.is_empty());
    }

    #[test]
    fn without_timeout_requests_wait_indefinitely() {
        let mut client = open_client(RequestPolicy {
            timeout_ms: None,
            max_pending: 8,
        });
        client.request(MessageType::CurrentModelRequest, None).unwrap();
        client.tick(1.0e9);
        assert_eq!(client.pending_count(), 1);
    }

    #[test]
    fn pending_table_is_bounded() {
        let mut client = open_client(RequestPolicy {
            timeout_ms: None,
            max_pending: 2,
        });
        client.request(MessageType::CurrentModelRequest, None).unwrap();
        client.request(MessageType::CurrentModelRequest, None).unwrap();

        let err = client
            .request(MessageType::CurrentModelRequest, None)
            .unwrap_err();
        assert_eq!(err, RpcError::TooManyPending(2));
        assert_eq!(client.issued(), 2);
        assert_eq!(client.transport().sent.len(), 2);
    }

    #[test]
    fn receive_failure_closes_and_fails_pending() {
        let mut client = open_client(RequestPolicy::default());
        let pending = client.request(MessageType::CurrentModelRequest, None).unwrap();
        client.transport_mut().fail_receive = true;

        assert_eq!(client.pump(), 0);
        assert_eq!(client.state(), ConnectionState::Closed);
        assert_eq!(
            block_on(pending).unwrap_err(),
            RpcError::Closed("socket reset".to_string())
        );
        assert_eq!(
            client
                .request(MessageType::CurrentModelRequest, None)
                .unwrap_err(),
            RpcError::Closed("socket reset".to_string())
        );
    }

    fn run_authorize(
        link: &VtsLink<Loopback>,
        pool: &mut LocalPool,
    ) -> Rc<RefCell<Option<Result<(), AuthError>>>> {
        let result = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&result);
        let task_link = link.clone();
        pool.spawner()
            .spawn_local(async move {
                let identity = PluginIdentity::new("Crane Game", "SnareChops");
                *slot.borrow_mut() = Some(task_link.authorize(&identity).await);
            })
            .unwrap();
        pool.run_until_stalled();
        result
    }

    fn open_link() -> VtsLink<Loopback> {
        let link = VtsLink::new(RpcClient::new(Loopback::default(), RequestPolicy::default()));
        link.open();
        link
    }

    #[test]
    fn authorize_exchanges_token_for_session() {
        let link = open_link();
        let mut pool = LocalPool::new();
        let result = run_authorize(&link, &mut pool);

        let token_request = link.with_client(|client| client.transport().sent_json(0));
        assert_eq!(token_request["messageType"], "AuthenticationTokenRequest");
        assert_eq!(token_request["data"]["pluginName"], "Crane Game");
        assert_eq!(token_request["data"]["pluginDeveloper"], "SnareChops");

        link.with_client(|client| {
            client.handle_message(&response(0, json!({ "authenticationToken": "tok-123" })))
        });
        pool.run_until_stalled();

        let auth_request = link.with_client(|client| client.transport().sent_json(1));
        assert_eq!(auth_request["messageType"], "AuthenticationRequest");
        assert_eq!(auth_request["requestID"], "1");
        assert_eq!(auth_request["data"]["authenticationToken"], "tok-123");
        assert!(result.borrow().is_none());

        link.with_client(|client| {
            client.handle_message(&response(1, json!({ "authenticated": true, "reason": "" })))
        });
        pool.run_until_stalled();

        assert_eq!(*result.borrow(), Some(Ok(())));
    }

    #[test]
    fn authorize_stops_without_token() {
        let link = open_link();
        let mut pool = LocalPool::new();
        let result = run_authorize(&link, &mut pool);

        link.with_client(|client| client.handle_message(&response(0, json!({}))));
        pool.run_until_stalled();

        assert_eq!(*result.borrow(), Some(Err(AuthError::NoToken)));
        assert_eq!(link.with_client(|client| client.transport().sent.len()), 1);
    }

    #[test]
    fn authorize_reports_rejection() {
        let link = open_link();
        let mut pool = LocalPool::new();
        let result = run_authorize(&link, &mut pool);

        link.with_client(|client| {
            client.handle_message(&response(0, json!({ "authenticationToken": "tok" })))
        });
        pool.run_until_stalled();
        link.with_client(|client| {
            client.handle_message(&response(
                1,
                json!({ "authenticated": false, "reason": "user denied" }),
            ))
        });
        pool.run_until_stalled();

        assert_eq!(
            *result.borrow(),
            Some(Err(AuthError::Rejected("user denied".to_string())))
        );
    }
}
