// service/access_policy.rs
//! The single authorization decision point. Every mutating service operation
//! asks `AccessPolicy::can` before touching the store. Anything without an
//! explicit allow rule, including a target of the wrong kind, is denied.

use crate::models::{
    chatmodels::ConversationId,
    labourmodel::{Contract, Job},
    usermodel::{email_domain, User, UserRole},
};

use super::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AdminLogin,
    DecideAdminRequest,
    ViewAllUsers,
    CreateJob,
    SubmitProposal,
    ViewJobProposals,
    AcceptProposal,
    ViewContract,
    UpdateContractStatus,
    ViewAllContracts,
    UploadVerificationDocument,
    ReviewVerificationDocument,
    SendDirectMessage,
    ReadConversation,
}

impl Action {
    pub const ALL: [Action; 14] = [
        Action::AdminLogin,
        Action::DecideAdminRequest,
        Action::ViewAllUsers,
        Action::CreateJob,
        Action::SubmitProposal,
        Action::ViewJobProposals,
        Action::AcceptProposal,
        Action::ViewContract,
        Action::UpdateContractStatus,
        Action::ViewAllContracts,
        Action::UploadVerificationDocument,
        Action::ReviewVerificationDocument,
        Action::SendDirectMessage,
        Action::ReadConversation,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            Action::AdminLogin => "log in as admin",
            Action::DecideAdminRequest => "decide admin requests",
            Action::ViewAllUsers => "view all users",
            Action::CreateJob => "create jobs",
            Action::SubmitProposal => "submit proposals",
            Action::ViewJobProposals => "view proposals for this job",
            Action::AcceptProposal => "accept proposals for this job",
            Action::ViewContract => "view this contract",
            Action::UpdateContractStatus => "update this contract",
            Action::ViewAllContracts => "view all contracts",
            Action::UploadVerificationDocument => "upload verification documents",
            Action::ReviewVerificationDocument => "review verification documents",
            Action::SendDirectMessage => "message this user",
            Action::ReadConversation => "read this conversation",
        }
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    None,
    User(&'a User),
    Job(&'a Job),
    Contract(&'a Contract),
    Conversation(&'a ConversationId),
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_domains: Vec<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admin_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admin_domains = admin_domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self { admin_domains }
    }

    pub fn admin_domains(&self) -> &[String] {
        &self.admin_domains
    }

    /// Exact domain match; subdomains of a reserved domain are not reserved.
    pub fn is_reserved_domain(&self, email: &str) -> bool {
        let domain = email_domain(email);
        !domain.is_empty() && self.admin_domains.iter().any(|d| *d == domain)
    }

    pub fn can(&self, actor: &User, action: Action, target: Target<'_>) -> bool {
        match (action, target) {
            (Action::AdminLogin, Target::None) => {
                actor.role == UserRole::Admin
                    && actor.admin_approved
                    && self.is_reserved_domain(&actor.email)
            }
            (Action::DecideAdminRequest, Target::None) => actor.is_active_admin(),
            (Action::DecideAdminRequest, Target::User(subject)) => {
                actor.is_active_admin() && subject.role == UserRole::Admin && subject.id != actor.id
            }
            (Action::ViewAllUsers, Target::None)
            | (Action::ViewAllContracts, Target::None)
            | (Action::ReviewVerificationDocument, Target::None) => actor.is_active_admin(),
            (Action::CreateJob, Target::None) => actor.role == UserRole::Client,
            (Action::SubmitProposal, Target::Job(job)) => {
                actor.is_verified_freelancer() && job.owner_id != actor.id
            }
            (Action::ViewJobProposals, Target::Job(job)) => {
                job.owner_id == actor.id || actor.is_active_admin()
            }
            (Action::AcceptProposal, Target::Job(job)) => job.owner_id == actor.id,
            (Action::ViewContract, Target::Contract(contract)) => {
                contract.involves(actor.id) || actor.is_active_admin()
            }
            (Action::UpdateContractStatus, Target::Contract(contract)) => {
                contract.client_id == actor.id || actor.is_active_admin()
            }
            (Action::UploadVerificationDocument, Target::None) => {
                actor.role == UserRole::Freelancer
            }
            (Action::SendDirectMessage, Target::User(receiver)) => actor.id != receiver.id,
            (Action::ReadConversation, Target::Conversation(conversation)) => {
                conversation.includes(actor.id)
            }
            _ => false,
        }
    }

    pub fn ensure(&self, actor: &User, action: Action, target: Target<'_>) -> Result<(), ServiceError> {
        if self.can(actor, action, target) {
            Ok(())
        } else {
            tracing::debug!(actor = %actor.id, action = ?action, "access denied");
            Err(ServiceError::forbidden(format!(
                "user {} may not {}",
                actor.id,
                action.to_str()
            )))
        }
    }
}
