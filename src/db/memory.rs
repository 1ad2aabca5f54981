//! In-memory storage for tests and for running without a database.
//!
//! Each table group sits behind one tokio lock, so every multi-row operation
//! (acceptance, contract transitions, document review) runs under a single
//! guard and is all-or-nothing: validation happens before the first write.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{ChatExt, LaborExt, StoreError, UserExt, VerificationExt};
use crate::models::{
    chatmodels::{ConversationId, Message, NewMessage},
    labourmodel::*,
    usermodel::{normalize_email, AdminDecisionRecord, Decision, NewUser, User, UserRole, VerificationStatus},
    verificationmodels::{DocumentReview, DocumentStatus, DocumentType, VerificationDocument},
};

#[derive(Debug, Default)]
struct LabourTables {
    jobs: HashMap<Uuid, Job>,
    proposals: Vec<Proposal>,
    contracts: Vec<Contract>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    documents: Mutex<Vec<VerificationDocument>>,
    labour: Mutex<LabourTables>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        let email = normalize_email(&user.email);
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email,
            name: user.name,
            password: user.password,
            role: user.role,
            verification_status: user.verification_status,
            admin_approved: user.admin_approved,
            department: user.department,
            reason: user.reason,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let skip = (page.max(1) as usize - 1) * limit;
        Ok(users.into_iter().skip(skip).take(limit).collect())
    }

    async fn get_user_count(&self) -> Result<i64, StoreError> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn get_pending_admins(&self) -> Result<Vec<User>, StoreError> {
        let mut pending: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| {
                u.role == UserRole::Admin
                    && u.verification_status == VerificationStatus::PendingAdminApproval
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(pending)
    }

    async fn decide_admin_request(
        &self,
        target_id: Uuid,
        record: AdminDecisionRecord,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        let Some(user) = users.get_mut(&target_id) else {
            return Ok(None);
        };
        if user.role != UserRole::Admin
            || user.verification_status != VerificationStatus::PendingAdminApproval
        {
            return Ok(None);
        }

        let approved = record.decision == Decision::Approved;
        user.verification_status = record.decision.as_status();
        user.admin_approved = approved;
        if approved {
            user.approved_by = Some(record.approver_id);
            user.approved_at = Some(record.decided_at);
            user.rejection_reason = None;
        } else {
            user.approved_by = None;
            user.approved_at = None;
            user.rejection_reason = record.notes;
        }
        user.updated_at = record.decided_at;

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl VerificationExt for MemoryStore {
    async fn create_verification_document(
        &self,
        user_id: Uuid,
        document_type: DocumentType,
        document_url: String,
    ) -> Result<VerificationDocument, StoreError> {
        let mut documents = self.documents.lock().await;

        if documents
            .iter()
            .any(|d| d.user_id == user_id && d.status == DocumentStatus::Pending)
        {
            return Err(StoreError::Conflict(
                "a verification document is already pending review".into(),
            ));
        }

        let document = VerificationDocument {
            id: Uuid::new_v4(),
            user_id,
            document_type,
            document_url,
            status: DocumentStatus::Pending,
            reviewed_by: None,
            review_notes: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        documents.push(document.clone());

        Ok(document)
    }

    async fn get_verification_document(
        &self,
        document_id: Uuid,
    ) -> Result<Option<VerificationDocument>, StoreError> {
        Ok(self
            .documents
            .lock()
            .await
            .iter()
            .find(|d| d.id == document_id)
            .cloned())
    }

    async fn get_user_verification_documents(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<VerificationDocument>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .rev()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_pending_verification_documents(
        &self,
    ) -> Result<Vec<VerificationDocument>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|d| d.status == DocumentStatus::Pending)
            .cloned()
            .collect())
    }

    async fn review_verification_document(
        &self,
        document_id: Uuid,
        review: DocumentReview,
    ) -> Result<Option<(VerificationDocument, User)>, StoreError> {
        // Lock order: documents, then users.
        let mut documents = self.documents.lock().await;
        let mut users = self.users.write().await;

        let Some(document) = documents
            .iter_mut()
            .find(|d| d.id == document_id && d.status == DocumentStatus::Pending)
        else {
            return Ok(None);
        };
        let user = users
            .get_mut(&document.user_id)
            .ok_or(StoreError::NotFound("User"))?;

        document.status = DocumentStatus::from(review.decision);
        document.reviewed_by = Some(review.reviewer_id);
        document.review_notes = review.notes;
        document.reviewed_at = Some(review.reviewed_at);

        user.verification_status = review.decision.as_status();
        user.updated_at = review.reviewed_at;

        Ok(Some((document.clone(), user.clone())))
    }
}

#[async_trait]
impl LaborExt for MemoryStore {
    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            owner_id: job.owner_id,
            title: job.title,
            description: job.description,
            budget: job.budget,
            status: JobStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.labour.lock().await.jobs.insert(job.id, job.clone());

        Ok(job)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.labour.lock().await.jobs.get(&job_id).cloned())
    }

    async fn get_open_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let labour = self.labour.lock().await;
        let mut jobs: Vec<Job> = labour
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Open)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(jobs)
    }

    async fn get_owner_jobs(&self, owner_id: Uuid) -> Result<Vec<Job>, StoreError> {
        let labour = self.labour.lock().await;
        let mut jobs: Vec<Job> = labour
            .jobs
            .values()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(jobs)
    }

    async fn create_proposal(&self, proposal: NewProposal) -> Result<Proposal, StoreError> {
        let mut labour = self.labour.lock().await;

        let job = labour
            .jobs
            .get(&proposal.job_id)
            .ok_or(StoreError::NotFound("Job"))?;
        if job.status != JobStatus::Open {
            return Err(StoreError::Conflict(format!(
                "job {} is {}, proposals are closed",
                job.id,
                job.status.to_str()
            )));
        }
        if labour
            .proposals
            .iter()
            .any(|p| p.job_id == proposal.job_id && p.freelancer_id == proposal.freelancer_id)
        {
            return Err(StoreError::Conflict(
                "a proposal from this freelancer already exists".into(),
            ));
        }

        let created = Proposal {
            id: Uuid::new_v4(),
            job_id: proposal.job_id,
            freelancer_id: proposal.freelancer_id,
            bid_amount: proposal.bid_amount,
            cover_letter: proposal.cover_letter,
            status: ProposalStatus::Submitted,
            created_at: Utc::now(),
        };
        labour.proposals.push(created.clone());

        Ok(created)
    }

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, StoreError> {
        Ok(self
            .labour
            .lock()
            .await
            .proposals
            .iter()
            .find(|p| p.id == proposal_id)
            .cloned())
    }

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, StoreError> {
        Ok(self
            .labour
            .lock()
            .await
            .proposals
            .iter()
            .filter(|p| p.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn get_freelancer_proposals(
        &self,
        freelancer_id: Uuid,
    ) -> Result<Vec<Proposal>, StoreError> {
        Ok(self
            .labour
            .lock()
            .await
            .proposals
            .iter()
            .rev()
            .filter(|p| p.freelancer_id == freelancer_id)
            .cloned()
            .collect())
    }

    async fn accept_proposal(
        &self,
        job_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<AcceptanceOutcome, StoreError> {
        let mut guard = self.labour.lock().await;
        let labour = &mut *guard;

        // Validate everything before the first write.
        let job = labour.jobs.get(&job_id).ok_or(StoreError::NotFound("Job"))?;
        if job.status != JobStatus::Open {
            return Err(StoreError::Conflict(format!(
                "job {} is {}, not open",
                job_id,
                job.status.to_str()
            )));
        }
        if labour.contracts.iter().any(|c| c.job_id == job_id) {
            return Err(StoreError::Conflict(format!(
                "a contract already exists for job {}",
                job_id
            )));
        }
        let proposal = labour
            .proposals
            .iter()
            .find(|p| p.id == proposal_id && p.job_id == job_id)
            .ok_or(StoreError::NotFound("Proposal"))?;
        if proposal.status != ProposalStatus::Submitted {
            return Err(StoreError::Conflict(format!(
                "proposal {} is {}",
                proposal_id,
                proposal.status.to_str()
            )));
        }

        let now = Utc::now();
        let mut accepted = None;
        let mut rejected = Vec::new();
        for p in labour.proposals.iter_mut().filter(|p| p.job_id == job_id) {
            if p.id == proposal_id {
                p.status = ProposalStatus::Accepted;
                accepted = Some(p.clone());
            } else if p.status == ProposalStatus::Submitted {
                p.status = ProposalStatus::Rejected;
                rejected.push(p.clone());
            }
        }
        let accepted = accepted.ok_or(StoreError::NotFound("Proposal"))?;

        let job = labour
            .jobs
            .get_mut(&job_id)
            .ok_or(StoreError::NotFound("Job"))?;
        job.status = JobStatus::InProgress;
        job.updated_at = now;
        let job = job.clone();

        let contract = Contract {
            id: Uuid::new_v4(),
            job_id,
            proposal_id,
            client_id: job.owner_id,
            freelancer_id: accepted.freelancer_id,
            amount: accepted.bid_amount.clone(),
            status: ContractStatus::Active,
            created_at: now,
            updated_at: now,
        };
        labour.contracts.push(contract.clone());

        Ok(AcceptanceOutcome {
            job,
            accepted,
            rejected,
            contract,
        })
    }

    async fn get_contract_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, StoreError> {
        Ok(self
            .labour
            .lock()
            .await
            .contracts
            .iter()
            .find(|c| c.id == contract_id)
            .cloned())
    }

    async fn get_contract_by_job(&self, job_id: Uuid) -> Result<Option<Contract>, StoreError> {
        Ok(self
            .labour
            .lock()
            .await
            .contracts
            .iter()
            .find(|c| c.job_id == job_id)
            .cloned())
    }

    async fn get_contracts(&self, participant: Option<Uuid>) -> Result<Vec<Contract>, StoreError> {
        Ok(self
            .labour
            .lock()
            .await
            .contracts
            .iter()
            .rev()
            .filter(|c| participant.map_or(true, |id| c.involves(id)))
            .cloned()
            .collect())
    }

    async fn transition_contract(
        &self,
        contract_id: Uuid,
        next: ContractStatus,
    ) -> Result<ContractTransition, StoreError> {
        let mut guard = self.labour.lock().await;
        let labour = &mut *guard;

        let contract = labour
            .contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or(StoreError::NotFound("Contract"))?;
        if !contract.status.can_transition_to(next) {
            return Err(StoreError::Conflict(format!(
                "contract {} cannot move from {} to {}",
                contract_id,
                contract.status.to_str(),
                next.to_str()
            )));
        }
        let job = labour
            .jobs
            .get_mut(&contract.job_id)
            .ok_or(StoreError::NotFound("Job"))?;

        let now = Utc::now();
        contract.status = next;
        contract.updated_at = now;
        job.status = next.job_status();
        job.updated_at = now;

        Ok(ContractTransition {
            contract: contract.clone(),
            job: job.clone(),
        })
    }
}

#[async_trait]
impl ChatExt for MemoryStore {
    async fn save_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: message.conversation_id.to_string(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            is_read: false,
            created_at: Utc::now(),
        };
        self.messages.write().await.push(message.clone());

        Ok(message)
    }

    async fn get_user_messages(&self, user_id: Uuid) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, StoreError> {
        let key = conversation_id.to_string();
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.conversation_id == key)
            .cloned()
            .collect())
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        receiver_id: Uuid,
    ) -> Result<u64, StoreError> {
        let key = conversation_id.to_string();
        let mut changed = 0;
        for message in self.messages.write().await.iter_mut() {
            if message.conversation_id == key && message.receiver_id == receiver_id && !message.is_read {
                message.is_read = true;
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.receiver_id == user_id && !m.is_read)
            .count() as i64)
    }
}
