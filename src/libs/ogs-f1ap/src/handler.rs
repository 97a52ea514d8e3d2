//! gNB-DU F1AP procedure handler
//!
//! Drives the DU side of the F1 interface-management procedures: requests
//! from upper layers are built, encoded and handed to the transport; PDUs
//! from the CU are decoded, correlated and posted upward as events. A PDU
//! that fails to parse is answered on the wire (gNB-CU Configuration Update
//! Failure or Error Indication) instead of tearing the interface down.

use std::time::Duration;

use bytes::Bytes;
use ogs_asn1c::f1ap::pdu::{F1apPdu, MessageKind};
use ogs_asn1c::f1ap::types::ProcedureCode;
use tokio::sync::mpsc;

use crate::builder;
use crate::codec::{AperCodec, PduCodec};
use crate::error::{ErrorKind, F1apError, F1apResult};
use crate::parser;
use crate::transaction::TransactionCorrelator;
use crate::types::*;

/// SCTP association identifier
pub type AssocId = u32;

/// Stream carrying non-UE-associated signalling
pub const NON_UE_STREAM: u16 = 0;

/// Outbound side of the SCTP association
pub trait F1Transport: Send + Sync {
    /// Fire-and-forget; delivery failures are the transport's concern
    fn send(&self, assoc_id: AssocId, stream: u16, data: Bytes);
}

/// A PDU handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPdu {
    pub assoc_id: AssocId,
    pub stream: u16,
    pub data: Bytes,
}

/// A PDU received from the CU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPdu {
    pub assoc_id: AssocId,
    pub stream: u16,
    pub data: Bytes,
}

/// Transport that queues outbound PDUs on an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutboundPdu>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundPdu>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl F1Transport for ChannelTransport {
    fn send(&self, assoc_id: AssocId, stream: u16, data: Bytes) {
        let pdu = OutboundPdu {
            assoc_id,
            stream,
            data,
        };
        if self.tx.send(pdu).is_err() {
            log::warn!("Transport channel closed, PDU for association {assoc_id} dropped");
        }
    }
}

/// Events posted to upper layers
#[derive(Debug, Clone, PartialEq)]
pub enum F1apDuEvent {
    ResetRequest {
        assoc_id: AssocId,
        reset: Reset,
    },
    SetupResponse {
        assoc_id: AssocId,
        response: F1SetupResponse,
    },
    SetupFailure {
        assoc_id: AssocId,
        failure: F1SetupFailure,
    },
    /// CU-initiated; answer with [`F1apDuRequest::ConfigurationUpdateAcknowledge`]
    CuConfigurationUpdate {
        assoc_id: AssocId,
        update: GnbCuConfigurationUpdate,
    },
}

/// Requests from upper layers
#[derive(Debug, Clone, PartialEq)]
pub enum F1apDuRequest {
    /// The request's transaction id is replaced by a freshly allocated one
    SetupRequest {
        assoc_id: AssocId,
        request: F1SetupRequest,
    },
    /// The update's transaction id is replaced by a freshly allocated one
    ConfigurationUpdateRequest {
        assoc_id: AssocId,
        update: GnbDuConfigurationUpdate,
    },
    ResetAcknowledge {
        assoc_id: AssocId,
        transaction_id: TransactionId,
    },
    ConfigurationUpdateAcknowledge {
        assoc_id: AssocId,
        acknowledge: GnbCuConfigurationUpdateAcknowledge,
    },
    Reset {
        assoc_id: AssocId,
        cause: Cause,
        scope: ResetScope,
    },
}

/// DU-side F1AP procedure handler
pub struct F1apDu<T: F1Transport> {
    transport: T,
    codec: Box<dyn PduCodec>,
    correlator: TransactionCorrelator,
    events: mpsc::UnboundedSender<F1apDuEvent>,
    transaction_timeout: Option<Duration>,
}

impl<T: F1Transport> F1apDu<T> {
    pub fn new(transport: T, events: mpsc::UnboundedSender<F1apDuEvent>) -> Self {
        Self {
            transport,
            codec: Box::new(AperCodec),
            correlator: TransactionCorrelator::new(),
            events,
            transaction_timeout: None,
        }
    }

    pub fn with_codec(mut self, codec: impl PduCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Release DU-initiated transactions left unanswered for `timeout`
    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = Some(timeout);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn correlator(&self) -> &TransactionCorrelator {
        &self.correlator
    }

    // ========================================================================
    // Outbound procedures
    // ========================================================================

    fn transmit(&self, assoc_id: AssocId, pdu: &F1apPdu) -> F1apResult<()> {
        let data = self.codec.encode(pdu)?;
        log::debug!(
            "[{}] {} sent to association {assoc_id} ({} bytes)",
            pdu.procedure_code().name(),
            pdu.kind(),
            data.len()
        );
        self.transport.send(assoc_id, NON_UE_STREAM, data);
        Ok(())
    }

    /// Allocate a transaction, build with it and send; the id is released
    /// again when building or encoding fails
    fn send_with_transaction(
        &self,
        assoc_id: AssocId,
        procedure: ProcedureCode,
        build: impl FnOnce(TransactionId) -> F1apResult<F1apPdu>,
    ) -> F1apResult<TransactionId> {
        let id = self.correlator.allocate(procedure)?;
        let result = build(id).and_then(|pdu| self.transmit(assoc_id, &pdu));
        if let Err(e) = result {
            self.correlator.release(id);
            log::error!("[{}] Not sent: {e}", procedure.name());
            return Err(e);
        }
        Ok(id)
    }

    /// Send an F1 Setup Request and return its transaction id
    pub fn send_setup_request(
        &self,
        assoc_id: AssocId,
        request: F1SetupRequest,
    ) -> F1apResult<TransactionId> {
        self.send_with_transaction(assoc_id, ProcedureCode::F1_SETUP, |transaction_id| {
            builder::build_f1_setup_request(&F1SetupRequest {
                transaction_id,
                ..request
            })
        })
    }

    /// Send a gNB-DU Configuration Update and return its transaction id
    pub fn send_configuration_update(
        &self,
        assoc_id: AssocId,
        update: GnbDuConfigurationUpdate,
    ) -> F1apResult<TransactionId> {
        self.send_with_transaction(
            assoc_id,
            ProcedureCode::GNB_DU_CONFIGURATION_UPDATE,
            |transaction_id| {
                builder::build_gnb_du_configuration_update(&GnbDuConfigurationUpdate {
                    transaction_id,
                    ..update
                })
            },
        )
    }

    /// Send a DU-initiated Reset.
    ///
    /// Reset Acknowledge is not processed on the DU, so the id is not kept
    /// in flight.
    pub fn send_reset(
        &self,
        assoc_id: AssocId,
        cause: Cause,
        scope: ResetScope,
    ) -> F1apResult<TransactionId> {
        let transaction_id = self
            .correlator
            .next_unused()
            .ok_or(F1apError::TransactionIdsExhausted)?;
        let pdu = builder::build_reset(&Reset {
            transaction_id,
            cause,
            scope,
        })?;
        self.transmit(assoc_id, &pdu)?;
        Ok(transaction_id)
    }

    pub fn send_reset_acknowledge(
        &self,
        assoc_id: AssocId,
        transaction_id: TransactionId,
    ) -> F1apResult<()> {
        let pdu = builder::build_reset_acknowledge(&ResetAcknowledge { transaction_id })?;
        self.transmit(assoc_id, &pdu)
    }

    pub fn send_configuration_update_acknowledge(
        &self,
        assoc_id: AssocId,
        acknowledge: &GnbCuConfigurationUpdateAcknowledge,
    ) -> F1apResult<()> {
        let pdu = builder::build_gnb_cu_configuration_update_acknowledge(acknowledge)?;
        self.transmit(assoc_id, &pdu)
    }

    pub fn send_configuration_update_failure(
        &self,
        assoc_id: AssocId,
        failure: &GnbCuConfigurationUpdateFailure,
    ) -> F1apResult<()> {
        let pdu = builder::build_gnb_cu_configuration_update_failure(failure)?;
        self.transmit(assoc_id, &pdu)
    }

    /// Send an Error Indication, echoing `transaction_id` when known
    pub fn send_error_indication(
        &self,
        assoc_id: AssocId,
        transaction_id: Option<TransactionId>,
        cause: Option<Cause>,
    ) -> F1apResult<()> {
        let transaction_id = transaction_id
            .or_else(|| self.correlator.next_unused())
            .unwrap_or_default();
        let pdu = builder::build_error_indication(&ErrorIndication {
            transaction_id,
            cause,
        })?;
        self.transmit(assoc_id, &pdu)
    }

    /// Execute one upper-layer request
    pub fn handle_request(&self, request: F1apDuRequest) -> F1apResult<()> {
        match request {
            F1apDuRequest::SetupRequest { assoc_id, request } => {
                self.send_setup_request(assoc_id, request).map(drop)
            }
            F1apDuRequest::ConfigurationUpdateRequest { assoc_id, update } => {
                self.send_configuration_update(assoc_id, update).map(drop)
            }
            F1apDuRequest::ResetAcknowledge {
                assoc_id,
                transaction_id,
            } => self.send_reset_acknowledge(assoc_id, transaction_id),
            F1apDuRequest::ConfigurationUpdateAcknowledge {
                assoc_id,
                acknowledge,
            } => self.send_configuration_update_acknowledge(assoc_id, &acknowledge),
            F1apDuRequest::Reset {
                assoc_id,
                cause,
                scope,
            } => self.send_reset(assoc_id, cause, scope).map(drop),
        }
    }

    // ========================================================================
    // Inbound procedures
    // ========================================================================

    /// Decode and process one PDU received from the CU.
    ///
    /// Errors are returned after the peer has been answered, except for
    /// [`F1apError::UnimplementedProcedure`] which is never answered.
    pub fn handle_pdu(&self, assoc_id: AssocId, stream: u16, data: &[u8]) -> F1apResult<()> {
        let pdu = match self.codec.decode(data) {
            Ok(pdu) => pdu,
            Err(e) => {
                log::error!("Undecodable PDU from association {assoc_id}: {e}");
                self.answer(assoc_id, None, &e);
                return Err(e);
            }
        };

        let result = self.dispatch(assoc_id, stream, &pdu);
        if let Err(ref e) = result {
            self.answer(assoc_id, Some(&pdu), e);
        }
        result
    }

    fn dispatch(&self, assoc_id: AssocId, stream: u16, pdu: &F1apPdu) -> F1apResult<()> {
        match (pdu.kind(), pdu.procedure_code()) {
            (MessageKind::InitiatingMessage, ProcedureCode::RESET) => {
                if stream != NON_UE_STREAM {
                    log::warn!("[Reset] Received on stream {stream}, expected {NON_UE_STREAM}");
                }
                let reset = parser::parse_reset(pdu)?;
                log::info!("[Reset] F1 interface reset requested ({:?})", reset.cause);
                self.post(F1apDuEvent::ResetRequest { assoc_id, reset });
            }
            (MessageKind::SuccessfulOutcome, ProcedureCode::F1_SETUP) => {
                let response = parser::parse_f1_setup_response(pdu)
                    .inspect_err(|_| self.abandon(pdu))?;
                self.correlator
                    .complete(response.transaction_id, ProcedureCode::F1_SETUP)?;
                log::info!(
                    "[F1Setup] Accepted by {}",
                    response.gnb_cu_name.as_deref().unwrap_or("CU")
                );
                self.post(F1apDuEvent::SetupResponse { assoc_id, response });
            }
            (MessageKind::UnsuccessfulOutcome, ProcedureCode::F1_SETUP) => {
                let failure =
                    parser::parse_f1_setup_failure(pdu).inspect_err(|_| self.abandon(pdu))?;
                self.correlator
                    .complete(failure.transaction_id, ProcedureCode::F1_SETUP)?;
                log::warn!("[F1Setup] Rejected ({:?})", failure.cause);
                self.post(F1apDuEvent::SetupFailure { assoc_id, failure });
            }
            (MessageKind::InitiatingMessage, ProcedureCode::GNB_CU_CONFIGURATION_UPDATE) => {
                let update = parser::parse_gnb_cu_configuration_update(pdu)?;
                log::debug!(
                    "[gNBCUConfigurationUpdate] {} cell(s) to activate",
                    update.cells_to_activate.len()
                );
                self.post(F1apDuEvent::CuConfigurationUpdate { assoc_id, update });
            }
            (
                kind @ (MessageKind::SuccessfulOutcome | MessageKind::UnsuccessfulOutcome),
                code @ ProcedureCode::GNB_DU_CONFIGURATION_UPDATE,
            ) => {
                // Outcome is not interpreted; only its transaction is closed
                self.abandon(pdu);
                return Err(parser::unimplemented(kind, code));
            }
            (kind, code) => return Err(parser::unimplemented(kind, code)),
        }
        Ok(())
    }

    /// Close the transaction a response refers to without processing it
    fn abandon(&self, pdu: &F1apPdu) {
        if let Some(id) = parser::peek_transaction_id(pdu.message()) {
            if self.correlator.complete(id, pdu.procedure_code()).is_ok() {
                log::warn!(
                    "[{}] Transaction {id} closed unprocessed",
                    pdu.procedure_code().name()
                );
            }
        }
    }

    fn post(&self, event: F1apDuEvent) {
        if self.events.send(event).is_err() {
            log::warn!("Event channel closed, F1AP event dropped");
        }
    }

    /// Report a failed inbound procedure to the CU
    fn answer(&self, assoc_id: AssocId, pdu: Option<&F1apPdu>, err: &F1apError) {
        if err.kind() == ErrorKind::UnimplementedProcedure {
            log::warn!("{err}");
            return;
        }

        let cause = err.protocol_cause();
        let transaction_id = pdu.and_then(|pdu| parser::peek_transaction_id(pdu.message()));
        let is_cu_update = pdu.is_some_and(|pdu| {
            pdu.kind() == MessageKind::InitiatingMessage
                && pdu.procedure_code() == ProcedureCode::GNB_CU_CONFIGURATION_UPDATE
        });

        let sent = match transaction_id {
            Some(transaction_id) if is_cu_update => {
                log::warn!("[gNBCUConfigurationUpdate] Rejected: {err}");
                self.send_configuration_update_failure(
                    assoc_id,
                    &GnbCuConfigurationUpdateFailure {
                        transaction_id,
                        cause,
                        time_to_wait: None,
                    },
                )
            }
            _ => {
                log::warn!("Sending Error Indication: {err}");
                self.send_error_indication(assoc_id, transaction_id, Some(cause))
            }
        };
        if let Err(e) = sent {
            log::error!("Failed to answer association {assoc_id}: {e}");
        }
    }

    /// Event loop: serve upper-layer requests and inbound PDUs until either
    /// channel closes, expiring stale transactions when a timeout is set
    pub async fn run(
        &self,
        mut requests: mpsc::UnboundedReceiver<F1apDuRequest>,
        mut inbound: mpsc::UnboundedReceiver<InboundPdu>,
    ) {
        let period = self
            .transaction_timeout
            .map_or(Duration::from_secs(60), |timeout| timeout / 2)
            .max(Duration::from_millis(10));
        let mut expiry_timer = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = expiry_timer.tick() => {
                    if let Some(timeout) = self.transaction_timeout {
                        self.correlator.expire(timeout);
                    }
                }
                request = requests.recv() => {
                    let Some(request) = request else {
                        log::info!("F1AP request channel closed");
                        return;
                    };
                    if let Err(e) = self.handle_request(request) {
                        log::error!("F1AP request failed: {e}");
                    }
                }
                pdu = inbound.recv() => {
                    let Some(pdu) = pdu else {
                        log::info!("F1AP inbound channel closed");
                        return;
                    };
                    if let Err(e) = self.handle_pdu(pdu.assoc_id, pdu.stream, &pdu.data) {
                        log::warn!("F1AP PDU from association {} failed: {e}", pdu.assoc_id);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{decode_f1ap_pdu, F1apMessage};
    use ogs_asn1c::f1ap::ies::ProtocolIeContainer;
    use ogs_asn1c::f1ap::types::Criticality;

    const ASSOC: AssocId = 7;

    struct Harness {
        du: F1apDu<ChannelTransport>,
        sent: mpsc::UnboundedReceiver<OutboundPdu>,
        events: mpsc::UnboundedReceiver<F1apDuEvent>,
    }

    fn harness() -> Harness {
        let _ = env_logger::builder().is_test(true).try_init();
        let (transport, sent) = ChannelTransport::new();
        let (tx, events) = mpsc::unbounded_channel();
        Harness {
            du: F1apDu::new(transport, tx),
            sent,
            events,
        }
    }

    fn setup_request() -> F1SetupRequest {
        F1SetupRequest {
            transaction_id: 0,
            gnb_du_id: 3584,
            gnb_du_name: Some("du-test".to_string()),
            served_cells: vec![],
            rrc_version: RrcVersion([16, 6, 0]),
            bandwidth_policy: BandwidthPolicy::Strict,
        }
    }

    fn encode(pdu: F1apResult<F1apPdu>) -> Bytes {
        AperCodec.encode(&pdu.unwrap()).unwrap()
    }

    fn next_sent(h: &mut Harness) -> F1apMessage {
        let out = h.sent.try_recv().expect("nothing sent");
        assert_eq!(out.assoc_id, ASSOC);
        assert_eq!(out.stream, NON_UE_STREAM);
        decode_f1ap_pdu(&out.data).unwrap()
    }

    fn setup_response(transaction_id: TransactionId) -> F1SetupResponse {
        F1SetupResponse {
            transaction_id,
            gnb_cu_name: Some("cu-test".to_string()),
            cells_to_activate: vec![CellToActivate {
                nr_cgi: NrCgi {
                    plmn: PlmnId::new(1, 1, 2),
                    nr_cellid: 1,
                },
                nr_pci: Some(1),
                system_information: vec![],
            }],
            gnb_cu_rrc_version: RrcVersion([16, 6, 0]),
        }
    }

    #[test]
    fn test_setup_request_and_response() {
        let mut h = harness();
        let id = h.du.send_setup_request(ASSOC, setup_request()).unwrap();
        assert_eq!(id, 0);
        assert!(h.du.correlator().is_in_flight(id));

        let F1apMessage::F1SetupRequest(sent) = next_sent(&mut h) else {
            panic!("expected F1SetupRequest");
        };
        assert_eq!(sent.transaction_id, id);
        assert_eq!(sent.gnb_du_id, 3584);

        let data = encode(builder::build_f1_setup_response(&setup_response(id)));
        h.du.handle_pdu(ASSOC, 0, &data).unwrap();
        assert_eq!(h.du.correlator().in_flight(), 0);
        assert_eq!(
            h.events.try_recv().unwrap(),
            F1apDuEvent::SetupResponse {
                assoc_id: ASSOC,
                response: setup_response(id),
            }
        );
    }

    #[test]
    fn test_setup_failure_releases_transaction() {
        let mut h = harness();
        let id = h.du.send_setup_request(ASSOC, setup_request()).unwrap();
        let failure = F1SetupFailure {
            transaction_id: id,
            cause: Cause::Misc(CauseMisc::Unspecified),
            time_to_wait: Some(TimeToWait::V5s),
        };
        let data = encode(builder::build_f1_setup_failure(&failure));
        h.du.handle_pdu(ASSOC, 0, &data).unwrap();
        assert!(!h.du.correlator().is_in_flight(id));
        assert_eq!(
            h.events.try_recv().unwrap(),
            F1apDuEvent::SetupFailure {
                assoc_id: ASSOC,
                failure,
            }
        );
    }

    #[test]
    fn test_response_with_unknown_transaction() {
        let mut h = harness();
        let data = encode(builder::build_f1_setup_response(&setup_response(9)));
        let err = h.du.handle_pdu(ASSOC, 0, &data).unwrap_err();
        assert!(matches!(err, F1apError::UnknownTransactionId(9)));
        assert!(h.events.try_recv().is_err());

        let F1apMessage::ErrorIndication(indication) = next_sent(&mut h) else {
            panic!("expected ErrorIndication");
        };
        assert_eq!(indication.transaction_id, 9);
        assert_eq!(
            indication.cause,
            Some(Cause::Protocol(CauseProtocol::MessageNotCompatibleWithReceiverState))
        );
    }

    #[test]
    fn test_reset_and_acknowledge() {
        let mut h = harness();
        let reset = Reset {
            transaction_id: 42,
            cause: Cause::RadioNetwork(CauseRadioNetwork::RlFailureRlc),
            scope: ResetScope::F1Interface,
        };
        let data = encode(builder::build_reset(&reset));
        h.du.handle_pdu(ASSOC, 1, &data).unwrap();
        assert_eq!(
            h.events.try_recv().unwrap(),
            F1apDuEvent::ResetRequest {
                assoc_id: ASSOC,
                reset,
            }
        );

        h.du.handle_request(F1apDuRequest::ResetAcknowledge {
            assoc_id: ASSOC,
            transaction_id: 42,
        })
        .unwrap();
        assert_eq!(
            next_sent(&mut h),
            F1apMessage::ResetAcknowledge(ResetAcknowledge { transaction_id: 42 })
        );
    }

    #[test]
    fn test_malformed_cu_update_answered_with_failure() {
        let mut h = harness();
        let mut container = ProtocolIeContainer::new();
        crate::ie::encode_transaction_id(&mut container, 21).unwrap();
        let pdu = F1apPdu::new(
            MessageKind::InitiatingMessage,
            ProcedureCode::GNB_CU_CONFIGURATION_UPDATE,
            Criticality::Reject,
            container,
        );
        let err = h.du.handle_pdu(ASSOC, 0, &encode(Ok(pdu))).unwrap_err();
        assert!(matches!(err, F1apError::MissingMandatoryIe { .. }));

        let F1apMessage::GnbCuConfigurationUpdateFailure(failure) = next_sent(&mut h) else {
            panic!("expected GNBCUConfigurationUpdateFailure");
        };
        assert_eq!(failure.transaction_id, 21);
        assert_eq!(
            failure.cause,
            Cause::Protocol(CauseProtocol::AbstractSyntaxErrorFalselyConstructedMessage)
        );
    }

    #[test]
    fn test_cu_update_event_and_acknowledge() {
        let mut h = harness();
        let update = GnbCuConfigurationUpdate {
            transaction_id: 3,
            cells_to_activate: setup_response(0).cells_to_activate,
        };
        let data = encode(builder::build_gnb_cu_configuration_update(&update));
        h.du.handle_pdu(ASSOC, 0, &data).unwrap();
        assert_eq!(
            h.events.try_recv().unwrap(),
            F1apDuEvent::CuConfigurationUpdate {
                assoc_id: ASSOC,
                update,
            }
        );

        h.du.handle_request(F1apDuRequest::ConfigurationUpdateAcknowledge {
            assoc_id: ASSOC,
            acknowledge: GnbCuConfigurationUpdateAcknowledge {
                transaction_id: 3,
                ..Default::default()
            },
        })
        .unwrap();
        assert_eq!(next_sent(&mut h).transaction_id(), 3);
    }

    #[test]
    fn test_unimplemented_procedure_not_answered() {
        let mut h = harness();
        let data = encode(builder::build_error_indication(&ErrorIndication {
            transaction_id: 1,
            cause: None,
        }));
        let err = h.du.handle_pdu(ASSOC, 0, &data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnimplementedProcedure);
        assert!(h.sent.try_recv().is_err());
    }

    fn du_update_outcome(kind: MessageKind, transaction_id: TransactionId) -> Bytes {
        let mut container = ProtocolIeContainer::new();
        crate::ie::encode_transaction_id(&mut container, transaction_id).unwrap();
        encode(Ok(F1apPdu::new(
            kind,
            ProcedureCode::GNB_DU_CONFIGURATION_UPDATE,
            Criticality::Reject,
            container,
        )))
    }

    #[test]
    fn test_du_update_outcome_releases_transaction() {
        let mut h = harness();
        let id = h
            .du
            .send_configuration_update(ASSOC, GnbDuConfigurationUpdate::default())
            .unwrap();
        assert!(matches!(next_sent(&mut h), F1apMessage::GnbDuConfigurationUpdate(_)));
        assert!(h.du.correlator().is_in_flight(id));

        let data = du_update_outcome(MessageKind::SuccessfulOutcome, id);
        let err = h.du.handle_pdu(ASSOC, 0, &data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnimplementedProcedure);
        assert_eq!(h.du.correlator().in_flight(), 0);
        assert!(h.sent.try_recv().is_err());
        assert!(h.events.try_recv().is_err());

        let id = h
            .du
            .send_configuration_update(ASSOC, GnbDuConfigurationUpdate::default())
            .unwrap();
        let data = du_update_outcome(MessageKind::UnsuccessfulOutcome, id);
        assert!(h.du.handle_pdu(ASSOC, 0, &data).is_err());
        assert_eq!(h.du.correlator().in_flight(), 0);
    }

    #[test]
    fn test_acknowledged_du_updates_do_not_exhaust_ids() {
        let mut h = harness();
        for _ in 0..=TransactionId::MAX as usize {
            let id = h
                .du
                .send_configuration_update(ASSOC, GnbDuConfigurationUpdate::default())
                .unwrap();
            let data = du_update_outcome(MessageKind::SuccessfulOutcome, id);
            assert!(h.du.handle_pdu(ASSOC, 0, &data).is_err());
        }
        assert_eq!(h.du.correlator().in_flight(), 0);
        h.du.send_setup_request(ASSOC, setup_request()).unwrap();
    }

    #[test]
    fn test_undecodable_bytes() {
        let mut h = harness();
        assert!(h.du.handle_pdu(ASSOC, 0, &[0xFF]).is_err());
        let F1apMessage::ErrorIndication(indication) = next_sent(&mut h) else {
            panic!("expected ErrorIndication");
        };
        assert_eq!(
            indication.cause,
            Some(Cause::Protocol(CauseProtocol::TransferSyntaxError))
        );
    }

    struct FailingCodec;

    impl PduCodec for FailingCodec {
        fn encode(&self, _pdu: &F1apPdu) -> F1apResult<Bytes> {
            Err(F1apError::EncodeFailed("rejected".into()))
        }

        fn decode(&self, data: &[u8]) -> F1apResult<F1apPdu> {
            AperCodec.decode(data)
        }
    }

    #[test]
    fn test_encode_failure_releases_transaction() {
        let Harness { du, mut sent, .. } = harness();
        let du = du.with_codec(FailingCodec);
        let err = du.send_setup_request(ASSOC, setup_request()).unwrap_err();
        assert!(matches!(err, F1apError::EncodeFailed(_)));
        assert_eq!(du.correlator().in_flight(), 0);
        assert!(sent.try_recv().is_err());
    }

    #[test]
    fn test_configuration_error_is_not_sent() {
        let mut h = harness();
        let mut request = setup_request();
        request.gnb_du_name = Some("bad_name!".to_string());
        let err = h.du.send_setup_request(ASSOC, request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert_eq!(h.du.correlator().in_flight(), 0);
        assert!(h.sent.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_serves_requests() {
        let mut h = harness();
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (_in_tx, in_rx) = mpsc::unbounded_channel::<InboundPdu>();

        req_tx
            .send(F1apDuRequest::SetupRequest {
                assoc_id: ASSOC,
                request: setup_request(),
            })
            .unwrap();
        drop(req_tx);

        h.du.run(req_rx, in_rx).await;
        assert!(matches!(next_sent(&mut h), F1apMessage::F1SetupRequest(_)));
        assert_eq!(h.du.correlator().in_flight(), 1);
    }

    #[tokio::test]
    async fn test_run_expires_transactions() {
        let Harness { du, mut sent, .. } = harness();
        let du = du.with_transaction_timeout(Duration::from_millis(20));
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (_in_tx, in_rx) = mpsc::unbounded_channel::<InboundPdu>();

        req_tx
            .send(F1apDuRequest::ConfigurationUpdateRequest {
                assoc_id: ASSOC,
                update: GnbDuConfigurationUpdate::default(),
            })
            .unwrap();

        let ran = tokio::time::timeout(Duration::from_millis(200), du.run(req_rx, in_rx)).await;
        assert!(ran.is_err());
        assert!(sent.try_recv().is_ok());
        assert_eq!(du.correlator().in_flight(), 0);
    }
}
