use std::mem;

use tracing::{debug, warn};

use crate::context::CallContext;
use crate::protocol::{Stage, TransportError, WireRequest, WireResponse};
use crate::transport::HttpClient;

/// Where a [`TransportDriver`] stands in its attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DriverPhase {
    Idle,
    RequestBuilt,
    Sent,
    ResponseBound,
    Complete,
}

#[derive(Debug)]
enum DriverState {
    Idle,
    RequestBuilt(WireRequest),
    Sent(WireResponse),
    ResponseBound,
    Complete,
}

impl DriverState {
    fn phase(&self) -> DriverPhase {
        match self {
            DriverState::Idle => DriverPhase::Idle,
            DriverState::RequestBuilt(_) => DriverPhase::RequestBuilt,
            DriverState::Sent(_) => DriverPhase::Sent,
            DriverState::ResponseBound => DriverPhase::ResponseBound,
            DriverState::Complete => DriverPhase::Complete,
        }
    }
}

/// Runs one send attempt of a [`CallContext`]:
/// `Idle -> RequestBuilt -> Sent -> ResponseBound -> Complete`.
///
/// A driver is created per attempt and is not reused. A failing step ends the
/// attempt, and the driver reports `Complete` afterwards.
#[derive(Debug)]
pub struct TransportDriver<'a, C: ?Sized> {
    client: &'a C,
    context: &'a mut CallContext,
    state: DriverState,
}

impl<'a, C> TransportDriver<'a, C>
where
    C: HttpClient + ?Sized,
{
    pub fn new(client: &'a C, context: &'a mut CallContext) -> Self {
        Self { client, context, state: DriverState::Idle }
    }

    pub fn phase(&self) -> DriverPhase {
        self.state.phase()
    }

    /// Drives the attempt until the response is bound to the context.
    pub async fn run(mut self) -> Result<(), TransportError> {
        while self.step().await? != DriverPhase::Complete {}
        Ok(())
    }

    /// Performs a single transition and returns the phase reached.
    pub async fn step(&mut self) -> Result<DriverPhase, TransportError> {
        let state = mem::replace(&mut self.state, DriverState::Complete);

        self.state = match state {
            DriverState::Idle => DriverState::RequestBuilt(self.context.build_wire_request()?),
            DriverState::RequestBuilt(request) => DriverState::Sent(self.send(request).await?),
            DriverState::Sent(response) => {
                self.context.bind_response(response);
                DriverState::ResponseBound
            }
            DriverState::ResponseBound | DriverState::Complete => DriverState::Complete,
        };

        let phase = self.state.phase();
        debug!(request = %self.context, ?phase, "transport driver advanced");
        Ok(phase)
    }

    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let cancel = self.context.cancellation();
        if cancel.is_cancelled() {
            return Err(TransportError::cancelled(Stage::Send));
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransportError::cancelled(Stage::Send)),
            result = self.client.send(request, cancel) => result,
        };

        result.map_err(|e| {
            // a client aborting on the token reports its own error, the caller sees the cancellation
            if cancel.is_cancelled() {
                TransportError::cancelled(Stage::Send)
            } else {
                warn!(request = %self.context, "http client failed: {}", e);
                TransportError::failure(Stage::Send, e)
            }
        })
    }
}
