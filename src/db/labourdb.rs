// db/labourdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, is_unique_violation, StoreError};
use crate::models::labourmodel::*;

#[async_trait]
pub trait LaborExt {
    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    async fn get_open_jobs(&self) -> Result<Vec<Job>, StoreError>;

    async fn get_owner_jobs(&self, owner_id: Uuid) -> Result<Vec<Job>, StoreError>;

    /// Inserts a submitted proposal while the job is still open. A job that has
    /// moved on, or a second bid by the same freelancer, is a `Conflict`.
    async fn create_proposal(&self, proposal: NewProposal) -> Result<Proposal, StoreError>;

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, StoreError>;

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, StoreError>;

    async fn get_freelancer_proposals(
        &self,
        freelancer_id: Uuid,
    ) -> Result<Vec<Proposal>, StoreError>;

    /// The acceptance transition group. Either all of
    /// proposal → accepted, siblings → rejected, job → in_progress and the new
    /// contract are persisted, or none of them are.
    async fn accept_proposal(
        &self,
        job_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<AcceptanceOutcome, StoreError>;

    async fn get_contract_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, StoreError>;

    async fn get_contract_by_job(&self, job_id: Uuid) -> Result<Option<Contract>, StoreError>;

    /// Contracts where `participant` is client or freelancer, or every contract for `None`.
    async fn get_contracts(&self, participant: Option<Uuid>) -> Result<Vec<Contract>, StoreError>;

    /// Moves an active contract into `next` and mirrors the job status, atomically.
    async fn transition_contract(
        &self,
        contract_id: Uuid,
        next: ContractStatus,
    ) -> Result<ContractTransition, StoreError>;
}

#[async_trait]
impl LaborExt for DBClient {
    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, owner_id, title, description, budget)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, title, description, budget, status, created_at, updated_at
            "#
        )
        .bind(Uuid::new_v4())
        .bind(job.owner_id)
        .bind(job.title)
        .bind(job.description)
        .bind(job.budget)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, owner_id, title, description, budget, status, created_at, updated_at
            FROM jobs
            WHERE id = $1
            "#
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_open_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, owner_id, title, description, budget, status, created_at, updated_at
            FROM jobs
            WHERE status = 'open'::job_status
            ORDER BY created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn get_owner_jobs(&self, owner_id: Uuid) -> Result<Vec<Job>, StoreError> {
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, owner_id, title, description, budget, status, created_at, updated_at
            FROM jobs
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn create_proposal(&self, proposal: NewProposal) -> Result<Proposal, StoreError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE waits on a concurrent acceptance holding the row FOR UPDATE.
        let status = sqlx::query_scalar::<_, JobStatus>(
            "SELECT status FROM jobs WHERE id = $1 FOR SHARE",
        )
        .bind(proposal.job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("Job"))?;

        if status != JobStatus::Open {
            return Err(StoreError::Conflict(format!(
                "job {} is {}, proposals are closed",
                proposal.job_id,
                status.to_str()
            )));
        }

        let created = sqlx::query_as::<_, Proposal>(
            r#"
            INSERT INTO proposals (id, job_id, freelancer_id, bid_amount, cover_letter)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, job_id, freelancer_id, bid_amount, cover_letter, status, created_at
            "#
        )
        .bind(Uuid::new_v4())
        .bind(proposal.job_id)
        .bind(proposal.freelancer_id)
        .bind(proposal.bid_amount)
        .bind(proposal.cover_letter)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("a proposal from this freelancer already exists".into())
            } else {
                StoreError::Database(e)
            }
        })?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, StoreError> {
        let proposal = sqlx::query_as::<_, Proposal>(
            r#"
            SELECT id, job_id, freelancer_id, bid_amount, cover_letter, status, created_at
            FROM proposals
            WHERE id = $1
            "#
        )
        .bind(proposal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(proposal)
    }

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, StoreError> {
        let proposals = sqlx::query_as::<_, Proposal>(
            r#"
            SELECT id, job_id, freelancer_id, bid_amount, cover_letter, status, created_at
            FROM proposals
            WHERE job_id = $1
            ORDER BY created_at ASC
            "#
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(proposals)
    }

    async fn get_freelancer_proposals(
        &self,
        freelancer_id: Uuid,
    ) -> Result<Vec<Proposal>, StoreError> {
        let proposals = sqlx::query_as::<_, Proposal>(
            r#"
            SELECT id, job_id, freelancer_id, bid_amount, cover_letter, status, created_at
            FROM proposals
            WHERE freelancer_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(freelancer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(proposals)
    }

    async fn accept_proposal(
        &self,
        job_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<AcceptanceOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // 1. Lock the job. Concurrent acceptances for the same job queue here.
        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, owner_id, title, description, budget, status, created_at, updated_at
            FROM jobs
            WHERE id = $1
            FOR UPDATE
            "#
        )
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("Job"))?;

        if job.status != JobStatus::Open {
            tracing::debug!(%job_id, status = job.status.to_str(), "acceptance lost: job not open");
            return Err(StoreError::Conflict(format!(
                "job {} is {}, not open",
                job_id,
                job.status.to_str()
            )));
        }

        // 2. One contract per job.
        let existing_contract = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM contracts WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing_contract.is_some() {
            return Err(StoreError::Conflict(format!(
                "a contract already exists for job {}",
                job_id
            )));
        }

        // 3. The chosen proposal must belong to this job and still be submitted.
        let proposal = sqlx::query_as::<_, Proposal>(
            r#"
            SELECT id, job_id, freelancer_id, bid_amount, cover_letter, status, created_at
            FROM proposals
            WHERE id = $1 AND job_id = $2
            FOR UPDATE
            "#
        )
        .bind(proposal_id)
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("Proposal"))?;

        if proposal.status != ProposalStatus::Submitted {
            return Err(StoreError::Conflict(format!(
                "proposal {} is {}",
                proposal_id,
                proposal.status.to_str()
            )));
        }

        // 4. Accept the winner, reject every sibling.
        let accepted = sqlx::query_as::<_, Proposal>(
            r#"
            UPDATE proposals
            SET status = 'accepted'::proposal_status
            WHERE id = $1
            RETURNING id, job_id, freelancer_id, bid_amount, cover_letter, status, created_at
            "#
        )
        .bind(proposal_id)
        .fetch_one(&mut *tx)
        .await?;

        let rejected = sqlx::query_as::<_, Proposal>(
            r#"
            UPDATE proposals
            SET status = 'rejected'::proposal_status
            WHERE job_id = $1 AND id <> $2 AND status = 'submitted'::proposal_status
            RETURNING id, job_id, freelancer_id, bid_amount, cover_letter, status, created_at
            "#
        )
        .bind(job_id)
        .bind(proposal_id)
        .fetch_all(&mut *tx)
        .await?;

        // 5. Job moves to in_progress.
        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = 'in_progress'::job_status, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, title, description, budget, status, created_at, updated_at
            "#
        )
        .bind(job_id)
        .fetch_one(&mut *tx)
        .await?;

        // 6. The contract, at the proposal's bid.
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            INSERT INTO contracts (id, job_id, proposal_id, client_id, freelancer_id, amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, job_id, proposal_id, client_id, freelancer_id, amount, status,
            created_at, updated_at
            "#
        )
        .bind(Uuid::new_v4())
        .bind(job_id)
        .bind(proposal_id)
        .bind(job.owner_id)
        .bind(accepted.freelancer_id)
        .bind(accepted.bid_amount.clone())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("a contract already exists for job {}", job_id))
            } else {
                StoreError::Database(e)
            }
        })?;

        tx.commit().await?;

        Ok(AcceptanceOutcome {
            job,
            accepted,
            rejected,
            contract,
        })
    }

    async fn get_contract_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, StoreError> {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            SELECT id, job_id, proposal_id, client_id, freelancer_id, amount, status,
            created_at, updated_at
            FROM contracts
            WHERE id = $1
            "#
        )
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    async fn get_contract_by_job(&self, job_id: Uuid) -> Result<Option<Contract>, StoreError> {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            SELECT id, job_id, proposal_id, client_id, freelancer_id, amount, status,
            created_at, updated_at
            FROM contracts
            WHERE job_id = $1
            "#
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    async fn get_contracts(&self, participant: Option<Uuid>) -> Result<Vec<Contract>, StoreError> {
        let contracts = sqlx::query_as::<_, Contract>(
            r#"
            SELECT id, job_id, proposal_id, client_id, freelancer_id, amount, status,
            created_at, updated_at
            FROM contracts
            WHERE $1::uuid IS NULL OR client_id = $1 OR freelancer_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(participant)
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }

    async fn transition_contract(
        &self,
        contract_id: Uuid,
        next: ContractStatus,
    ) -> Result<ContractTransition, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Contract>(
            r#"
            SELECT id, job_id, proposal_id, client_id, freelancer_id, amount, status,
            created_at, updated_at
            FROM contracts
            WHERE id = $1
            FOR UPDATE
            "#
        )
        .bind(contract_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("Contract"))?;

        if !current.status.can_transition_to(next) {
            return Err(StoreError::Conflict(format!(
                "contract {} cannot move from {} to {}",
                contract_id,
                current.status.to_str(),
                next.to_str()
            )));
        }

        let contract = sqlx::query_as::<_, Contract>(
            r#"
            UPDATE contracts
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, job_id, proposal_id, client_id, freelancer_id, amount, status,
            created_at, updated_at
            "#
        )
        .bind(contract_id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, title, description, budget, status, created_at, updated_at
            "#
        )
        .bind(contract.job_id)
        .bind(next.job_status())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ContractTransition { contract, job })
    }
}
