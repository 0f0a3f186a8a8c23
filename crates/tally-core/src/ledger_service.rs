//! Period mutations and the movement log they produce.

use chrono::Utc;
use rust_decimal::Decimal;

use tally_domain::{
    compare_periods, ActorRef, Book, Category, LedgerRecord, MovementFilter, MovementId,
    MovementKind, MovementLog, NetIncomePolicy, RecordId, RowOrder, User,
};

use crate::{
    validate::{check_amount, normalize_period, require_active, require_admin},
    CoreError,
};

/// Which kind of mutation triggered a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Add(Category),
    Other,
}

/// Outcome of [`LedgerService::reverse_movement`].
#[derive(Debug, Clone)]
pub struct Reversal {
    pub movement: MovementLog,
    /// The adjusted record, or `None` when the period no longer exists.
    pub record: Option<LedgerRecord>,
}

/// Validated operations over the ledger records of a [`Book`].
///
/// Every mutation refreshes the derived fields and appends an audit entry.
pub struct LedgerService;

impl LedgerService {
    /// Returns the record for `period`, creating a zeroed one when absent.
    pub fn get_or_create(book: &mut Book, period: &str) -> Result<RecordId, CoreError> {
        let period = normalize_period(period)?;
        if let Some(existing) = book.record_by_period(&period) {
            return Ok(existing.id);
        }
        let id = book.insert_record(period.clone());
        tracing::info!(%period, record = %id, "period created");
        Ok(id)
    }

    /// Adds `amount` to one category of `period`, creating the period if needed.
    pub fn apply_delta(
        book: &mut Book,
        period: &str,
        category: Category,
        amount: Decimal,
        actor: &User,
        policy: NetIncomePolicy,
    ) -> Result<LedgerRecord, CoreError> {
        require_active(actor)?;
        let amount = check_amount(amount)?;
        ensure_writable(category, policy)?;
        let id = Self::get_or_create(book, period)?;

        let record = book
            .record_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("record {id}")))?;
        record.add_amount(category, amount);
        refresh(record, policy, Mutation::Add(category));
        let snapshot = record.clone();

        let detail = format!(
            "Added {amount:.2} to '{}' in {}",
            category.key(),
            snapshot.period
        );
        append_movement(
            book,
            MovementKind::Add,
            &snapshot.period,
            Some(category),
            Some(amount),
            actor,
            detail,
        );
        tracing::info!(
            period = %snapshot.period,
            category = category.key(),
            %amount,
            actor = %actor.username,
            "amount added"
        );
        Ok(snapshot)
    }

    /// Overwrites one category of an existing record.
    pub fn set_field(
        book: &mut Book,
        record_id: RecordId,
        category: Category,
        value: Decimal,
        actor: &User,
        policy: NetIncomePolicy,
    ) -> Result<LedgerRecord, CoreError> {
        require_active(actor)?;
        let value = check_amount(value)?;
        ensure_writable(category, policy)?;

        let record = book
            .record_mut(record_id)
            .ok_or_else(|| CoreError::NotFound(format!("record {record_id}")))?;
        let previous = record.amount(category);
        record.set_amount(category, value);
        refresh(record, policy, Mutation::Other);
        let snapshot = record.clone();

        let detail = format!(
            "Set '{}' in {} from {previous:.2} to {value:.2}",
            category.key(),
            snapshot.period
        );
        append_movement(
            book,
            MovementKind::Edit,
            &snapshot.period,
            Some(category),
            Some(value),
            actor,
            detail,
        );
        tracing::info!(
            period = %snapshot.period,
            category = category.key(),
            %previous,
            %value,
            actor = %actor.username,
            "amount overwritten"
        );
        Ok(snapshot)
    }

    /// Replaces the free-text notes of a record. Empty text clears them.
    pub fn set_notes(
        book: &mut Book,
        record_id: RecordId,
        notes: Option<String>,
        actor: &User,
    ) -> Result<LedgerRecord, CoreError> {
        require_active(actor)?;
        let notes = notes
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let record = book
            .record_mut(record_id)
            .ok_or_else(|| CoreError::NotFound(format!("record {record_id}")))?;
        record.notes = notes;
        record.recompute_reconciliation();
        record.touch();
        let snapshot = record.clone();

        let detail = match &snapshot.notes {
            Some(_) => format!("Updated notes of {}", snapshot.period),
            None => format!("Cleared notes of {}", snapshot.period),
        };
        append_movement(
            book,
            MovementKind::Edit,
            &snapshot.period,
            None,
            None,
            actor,
            detail,
        );
        Ok(snapshot)
    }

    /// Logs the deletion and removes the record.
    pub fn delete_record(
        book: &mut Book,
        record_id: RecordId,
        actor: &User,
    ) -> Result<LedgerRecord, CoreError> {
        require_active(actor)?;
        let record = book
            .record(record_id)
            .ok_or_else(|| CoreError::NotFound(format!("record {record_id}")))?
            .clone();

        let detail = format!(
            "Deleted period {} (total {:.2}, actual income {:.2}, difference {:.2})",
            record.period,
            record.total(),
            record.actual_income_vs_invoiced,
            record.reconciliation_difference
        );
        append_movement(
            book,
            MovementKind::Delete,
            &record.period,
            None,
            None,
            actor,
            detail,
        );
        book.remove_record(record_id);
        tracing::info!(period = %record.period, actor = %actor.username, "period deleted");
        Ok(record)
    }

    /// Undoes an `add` movement, flooring the category at zero, and removes
    /// the movement from the log.
    ///
    /// A movement whose period has since been deleted is still removed.
    pub fn reverse_movement(
        book: &mut Book,
        movement_id: MovementId,
        actor: &User,
        policy: NetIncomePolicy,
    ) -> Result<Reversal, CoreError> {
        require_admin(actor)?;
        let movement = book
            .movement(movement_id)
            .ok_or_else(|| CoreError::NotFound(format!("movement {movement_id}")))?
            .clone();
        if movement.kind != MovementKind::Add {
            return Err(CoreError::Validation(format!(
                "movement {movement_id} is an `{}` entry; only `add` entries can be reversed",
                movement.kind
            )));
        }
        let (category, amount) = match (movement.category, movement.amount) {
            (Some(category), Some(amount)) => (category, amount),
            _ => {
                return Err(CoreError::Validation(format!(
                    "movement {movement_id} has no category amount"
                )))
            }
        };

        let record = match book.record_by_period_mut(&movement.period) {
            Some(record) => {
                let reduced = (record.amount(category) - amount).max(Decimal::ZERO);
                record.set_amount(category, reduced);
                refresh(record, policy, Mutation::Other);
                Some(record.clone())
            }
            None => {
                tracing::warn!(
                    movement = %movement_id,
                    period = %movement.period,
                    "reversing movement whose period no longer exists"
                );
                None
            }
        };

        book.remove_movement(movement_id);
        book.log_system(
            Some(ActorRef::from(actor)),
            "reverse_movement",
            format!(
                "Reversed movement {movement_id}: -{amount:.2} from '{}' in {}",
                category.key(),
                movement.period
            ),
        );
        tracing::info!(movement = %movement_id, actor = %actor.username, "movement reversed");
        Ok(Reversal { movement, record })
    }

    pub fn record(book: &Book, record_id: RecordId) -> Result<&LedgerRecord, CoreError> {
        book.record(record_id)
            .ok_or_else(|| CoreError::NotFound(format!("record {record_id}")))
    }

    pub fn record_by_period<'a>(book: &'a Book, period: &str) -> Result<&'a LedgerRecord, CoreError> {
        book.record_by_period(period.trim())
            .ok_or_else(|| CoreError::NotFound(format!("period {}", period.trim())))
    }

    pub fn list_records(book: &Book, order: RowOrder) -> Vec<&LedgerRecord> {
        let mut records: Vec<&LedgerRecord> = book.records.iter().collect();
        if order == RowOrder::Chronological {
            records.sort_by(|a, b| compare_periods(&a.period, &b.period));
        }
        records
    }

    /// Distinct period labels in calendar order, unparsable labels last.
    pub fn periods(book: &Book) -> Vec<String> {
        let mut periods: Vec<String> = Vec::new();
        for record in &book.records {
            if !periods.contains(&record.period) {
                periods.push(record.period.clone());
            }
        }
        periods.sort_by(|a, b| compare_periods(a, b));
        periods
    }

    /// Movement log, newest first.
    pub fn list_movements<'a>(book: &'a Book, filter: &MovementFilter) -> Vec<&'a MovementLog> {
        book.movements
            .iter()
            .rev()
            .filter(|movement| filter.matches(movement))
            .collect()
    }
}

fn ensure_writable(category: Category, policy: NetIncomePolicy) -> Result<(), CoreError> {
    if category.is_derived() && policy == NetIncomePolicy::Always {
        return Err(CoreError::Validation(format!(
            "'{}' is derived from maintenance income and DPPP",
            category.key()
        )));
    }
    Ok(())
}

fn refresh(record: &mut LedgerRecord, policy: NetIncomePolicy, mutation: Mutation) {
    let recompute_net = match policy {
        NetIncomePolicy::Always => true,
        // An add aimed at the net field itself keeps the entered amount.
        NetIncomePolicy::OnAdd => {
            matches!(mutation, Mutation::Add(category) if !category.is_derived())
        }
        NetIncomePolicy::Manual => false,
    };
    if recompute_net {
        record.recompute_net_maintenance();
    }
    record.recompute_reconciliation();
    record.touch();
}

fn append_movement(
    book: &mut Book,
    kind: MovementKind,
    period: &str,
    category: Option<Category>,
    amount: Option<Decimal>,
    actor: &User,
    detail: String,
) -> MovementId {
    let id = book.next_movement_id();
    book.push_movement(MovementLog {
        id,
        timestamp: Utc::now(),
        kind,
        period: period.to_string(),
        category,
        amount,
        actor: ActorRef::from(actor),
        detail,
    });
    id
}
