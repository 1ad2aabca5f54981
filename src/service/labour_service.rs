// service/labour_service.rs
use std::sync::Arc;

use num_traits::Zero;
use serde_json::json;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::Store,
    models::{
        labourmodel::*,
        usermodel::User,
    },
    service::{
        access_policy::{AccessPolicy, Action, Target},
        error::ServiceError,
        notification_service::{EventKind, LifecycleEvent, NotificationService},
    },
};

const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, Clone)]
pub struct LabourService {
    db_client: Arc<dyn Store>,
    policy: Arc<AccessPolicy>,
    notification_service: Arc<NotificationService>,
}

impl LabourService {
    pub fn new(
        db_client: Arc<dyn Store>,
        policy: Arc<AccessPolicy>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            policy,
            notification_service,
        }
    }

    pub async fn create_job(
        &self,
        client: &User,
        title: String,
        description: String,
        budget: BigDecimal,
    ) -> Result<Job, ServiceError> {
        self.policy.ensure(client, Action::CreateJob, Target::None)?;

        let title = title.trim().to_string();
        if title.is_empty() || title.len() > MAX_TITLE_LENGTH {
            return Err(ServiceError::Validation(format!(
                "Job title must be between 1 and {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        ensure_positive(&budget, "Budget")?;

        let job = self
            .db_client
            .create_job(NewJob {
                owner_id: client.id,
                title,
                description,
                budget,
            })
            .await?;

        tracing::info!(job_id = %job.id, owner_id = %client.id, "job created");
        Ok(job)
    }

    pub async fn open_jobs(&self) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_open_jobs().await?)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job".to_string()))
    }

    pub async fn my_jobs(&self, client: &User) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_owner_jobs(client.id).await?)
    }

    pub async fn submit_proposal(
        &self,
        freelancer: &User,
        job_id: Uuid,
        bid_amount: BigDecimal,
        cover_letter: String,
    ) -> Result<Proposal, ServiceError> {
        let job = self.get_job(job_id).await?;

        self.policy
            .ensure(freelancer, Action::SubmitProposal, Target::Job(&job))?;

        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidState(format!(
                "job is {}, not open for proposals",
                job.status.to_str()
            )));
        }
        ensure_positive(&bid_amount, "Bid amount")?;

        let proposal = self
            .db_client
            .create_proposal(NewProposal {
                job_id,
                freelancer_id: freelancer.id,
                bid_amount,
                cover_letter,
            })
            .await?;

        tracing::info!(
            proposal_id = %proposal.id,
            job_id = %job_id,
            freelancer_id = %freelancer.id,
            "proposal submitted"
        );
        Ok(proposal)
    }

    pub async fn job_proposals(
        &self,
        actor: &User,
        job_id: Uuid,
    ) -> Result<Vec<Proposal>, ServiceError> {
        let job = self.get_job(job_id).await?;
        self.policy
            .ensure(actor, Action::ViewJobProposals, Target::Job(&job))?;
        Ok(self.db_client.get_job_proposals(job_id).await?)
    }

    pub async fn my_proposals(&self, freelancer: &User) -> Result<Vec<Proposal>, ServiceError> {
        Ok(self.db_client.get_freelancer_proposals(freelancer.id).await?)
    }

    /// Awards the job to one proposal. The proposal's bid is the contract
    /// amount; an `agreed_amount` that disagrees with it is refused.
    pub async fn accept_proposal(
        &self,
        client: &User,
        job_id: Uuid,
        proposal_id: Uuid,
        agreed_amount: Option<BigDecimal>,
    ) -> Result<AcceptanceOutcome, ServiceError> {
        let job = self.get_job(job_id).await?;

        self.policy
            .ensure(client, Action::AcceptProposal, Target::Job(&job))?;

        let proposal = self
            .db_client
            .get_proposal_by_id(proposal_id)
            .await?
            .filter(|p| p.job_id == job_id)
            .ok_or_else(|| ServiceError::NotFound("Proposal".to_string()))?;

        if let Some(amount) = agreed_amount {
            if amount != proposal.bid_amount {
                return Err(ServiceError::Validation(format!(
                    "agreed amount {} does not match the proposal bid {}",
                    amount, proposal.bid_amount
                )));
            }
        }

        let outcome = self.db_client.accept_proposal(job_id, proposal_id).await?;

        tracing::info!(
            job_id = %job_id,
            proposal_id = %proposal_id,
            contract_id = %outcome.contract.id,
            rejected = outcome.rejected.len(),
            "proposal accepted"
        );

        // The transition is committed; a failed lookup only costs the recipient.
        let recipient = match self.db_client.get_user(outcome.accepted.freelancer_id).await {
            Ok(user) => user.map(|u| u.email),
            Err(e) => {
                tracing::warn!(error = %e, "could not resolve freelancer for notification");
                None
            }
        };

        self.notification_service
            .dispatch(vec![LifecycleEvent::new(
                EventKind::ProposalAccepted,
                recipient,
                json!({
                    "job_id": outcome.job.id,
                    "job_title": outcome.job.title,
                    "proposal_id": outcome.accepted.id,
                    "contract_id": outcome.contract.id,
                    "amount": outcome.contract.amount.to_string(),
                    "rejected_proposals": outcome.rejected.iter().map(|p| p.id).collect::<Vec<_>>(),
                }),
            )]);

        Ok(outcome)
    }

    pub async fn get_contract(&self, actor: &User, contract_id: Uuid) -> Result<Contract, ServiceError> {
        let contract = self.find_contract(contract_id).await?;
        self.policy
            .ensure(actor, Action::ViewContract, Target::Contract(&contract))?;
        Ok(contract)
    }

    /// Contracts the actor is party to; every contract for an approved admin.
    pub async fn my_contracts(&self, actor: &User) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.db_client.get_contracts(self.contract_scope(actor)).await?)
    }

    pub async fn update_contract_status(
        &self,
        actor: &User,
        contract_id: Uuid,
        new_status: ContractStatus,
    ) -> Result<ContractTransition, ServiceError> {
        let contract = self.find_contract(contract_id).await?;

        self.policy
            .ensure(actor, Action::UpdateContractStatus, Target::Contract(&contract))?;

        if !contract.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidState(format!(
                "contract cannot move from {} to {}",
                contract.status.to_str(),
                new_status.to_str()
            )));
        }

        let transition = self
            .db_client
            .transition_contract(contract_id, new_status)
            .await?;

        tracing::info!(
            contract_id = %contract_id,
            job_id = %transition.job.id,
            status = new_status.to_str(),
            "contract status updated"
        );
        Ok(transition)
    }

    pub async fn contract_stats(&self, actor: &User) -> Result<ContractStats, ServiceError> {
        let contracts = self.db_client.get_contracts(self.contract_scope(actor)).await?;
        Ok(summarize(&contracts))
    }

    async fn find_contract(&self, contract_id: Uuid) -> Result<Contract, ServiceError> {
        self.db_client
            .get_contract_by_id(contract_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Contract".to_string()))
    }

    fn contract_scope(&self, actor: &User) -> Option<Uuid> {
        if self
            .policy
            .can(actor, Action::ViewAllContracts, Target::None)
        {
            None
        } else {
            Some(actor.id)
        }
    }
}

fn ensure_positive(amount: &BigDecimal, field: &str) -> Result<(), ServiceError> {
    if amount <= &BigDecimal::zero() {
        return Err(ServiceError::Validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}

pub fn summarize(contracts: &[Contract]) -> ContractStats {
    let mut stats = ContractStats {
        total_contracts: 0,
        total_amount: BigDecimal::zero(),
        active: 0,
        completed: 0,
        cancelled: 0,
    };

    for contract in contracts {
        stats.total_contracts += 1;
        stats.total_amount += contract.amount.clone();
        match contract.status {
            ContractStatus::Active => stats.active += 1,
            ContractStatus::Completed => stats.completed += 1,
            ContractStatus::Cancelled => stats.cancelled += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn contract(amount: &str, status: ContractStatus) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            proposal_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            freelancer_id: Uuid::new_v4(),
            amount: BigDecimal::from_str(amount).unwrap(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_contracts() {
        let stats = summarize(&[
            contract("4500.00", ContractStatus::Active),
            contract("1200.50", ContractStatus::Completed),
            contract("300", ContractStatus::Cancelled),
            contract("99.50", ContractStatus::Completed),
        ]);

        assert_eq!(stats.total_contracts, 4);
        assert_eq!(stats.total_amount, BigDecimal::from_str("6100.00").unwrap());
        assert_eq!(stats.active, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.cancelled, 1);
    }

    #[test]
    fn test_summarize_nothing() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_contracts, 0);
        assert!(stats.total_amount.is_zero());
    }

    #[test]
    fn test_amounts_must_be_positive() {
        assert!(ensure_positive(&BigDecimal::from(5000), "Budget").is_ok());
        assert!(matches!(
            ensure_positive(&BigDecimal::zero(), "Budget"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            ensure_positive(&BigDecimal::from(-1), "Bid amount"),
            Err(ServiceError::Validation(_))
        ));
    }
}
