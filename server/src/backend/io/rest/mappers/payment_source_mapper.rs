use crate::backend::domain::models::{BalanceSnapshot, PaymentSource as DomainPaymentSource};
use shared::{BalanceSnapshotView, PaymentSourceView};

pub struct PaymentSourceMapper;

impl PaymentSourceMapper {
    pub fn to_dto(domain: DomainPaymentSource) -> PaymentSourceView {
        PaymentSourceView {
            id: domain.id,
            name: domain.name,
            kind: domain.kind,
            balance: domain.balance,
            track_payoff: domain.track_payoff,
        }
    }

    pub fn snapshot_to_dto(snapshot: BalanceSnapshot) -> BalanceSnapshotView {
        BalanceSnapshotView {
            payment_source_id: snapshot.payment_source_id,
            balance: snapshot.balance,
            recorded_on: snapshot.recorded_on,
        }
    }
}
