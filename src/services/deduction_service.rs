use std::sync::Arc;
use tracing::{info, warn};

use crate::database::PayrollStore;
use crate::dto::deduction_dto::DeductionPayload;
use crate::error::{Error, Result};
use crate::models::deduction::DeductionRule;
use crate::services::payroll_calculator::check_percentage;

#[derive(Clone)]
pub struct DeductionService {
    store: Arc<dyn PayrollStore>,
}

fn check_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("Deduction name is required".into()));
    }
    Ok(trimmed)
}

impl DeductionService {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: DeductionPayload) -> Result<DeductionRule> {
        let name = check_name(&payload.name)?;
        check_percentage(payload.percentage)?;
        let rule = self
            .store
            .insert_deduction(name, payload.percentage)
            .await
            .map_err(|e| {
                if matches!(e, Error::Conflict(_)) {
                    warn!(deduction = %name, "Attempt to create deduction with existing name");
                }
                e
            })?;
        info!(deduction = %rule.name, percentage = %rule.percentage, "Created deduction");
        Ok(rule)
    }

    pub async fn get(&self, name: &str) -> Result<DeductionRule> {
        self.store.find_deduction(name).await?.ok_or_else(|| {
            warn!(deduction = %name, "Deduction not found");
            Error::NotFound(format!("Deduction '{}' not found", name))
        })
    }

    pub async fn update(&self, name: &str, payload: DeductionPayload) -> Result<DeductionRule> {
        let new_name = check_name(&payload.name)?;
        check_percentage(payload.percentage)?;
        let rule = self
            .store
            .update_deduction(name, new_name, payload.percentage)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Deduction '{}' not found", name)))?;
        info!(deduction = %name, renamed_to = %rule.name, percentage = %rule.percentage, "Updated deduction");
        Ok(rule)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        if !self.store.delete_deduction(name).await? {
            warn!(deduction = %name, "Attempt to delete non-existent deduction");
            return Err(Error::NotFound(format!("Deduction '{}' not found", name)));
        }
        info!(deduction = %name, "Deleted deduction");
        Ok(())
    }

    /// Ordered by name so audit output is stable between calls.
    pub async fn list_all(&self) -> Result<Vec<DeductionRule>> {
        self.store.list_deductions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn service() -> DeductionService {
        DeductionService::new(Arc::new(MemoryStore::new()))
    }

    fn payload(name: &str, percentage: &str) -> DeductionPayload {
        DeductionPayload {
            name: name.to_string(),
            percentage: Decimal::from_str(percentage).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let svc = service();
        let created = svc.create(payload("Housing", "10")).await.unwrap();
        assert_eq!(created.percentage, Decimal::from(10));

        let err = svc.create(payload("Housing", "12")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let updated = svc.update("Housing", payload("Housing", "12.5")).await.unwrap();
        assert_eq!(updated.percentage, Decimal::from_str("12.5").unwrap());

        svc.delete("Housing").await.unwrap();
        assert!(matches!(svc.get("Housing").await, Err(Error::NotFound(_))));
        assert!(matches!(svc.delete("Housing").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn out_of_range_percentage_is_rejected() {
        let svc = service();
        for value in ["0", "-1.5", "100.5", "3.14159"] {
            let err = svc.create(payload("Pension", value)).await.unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
        assert!(svc.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_rule_is_not_found() {
        let err = service()
            .update("Nope", payload("Nope", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let svc = service();
        for name in ["Transport", "Housing", "Pension"] {
            svc.create(payload(name, "1")).await.unwrap();
        }
        let names: Vec<String> = svc
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Housing", "Pension", "Transport"]);
    }
}
