use async_trait::async_trait;
use tracing::info;
use crate::core::library::{LibraryError, LibraryResult, MemberStanding};

// MemberDirectory answers whether a borrower may take part in circulation.
#[async_trait]
pub trait MemberDirectory: Sync + Send {
    // None when the borrower is not known to the branch
    async fn standing(&self, borrower_id: &str) -> LibraryResult<Option<MemberStanding>>;
}

// Only members in good standing may borrow or queue; unknown borrowers are treated as ineligible.
pub async fn ensure_eligible(directory: &dyn MemberDirectory, borrower_id: &str) -> LibraryResult<()> {
    match directory.standing(borrower_id).await? {
        Some(MemberStanding::Active) => Ok(()),
        Some(standing) => {
            info!(borrower_id, standing = %standing, "borrower not eligible");
            Err(LibraryError::borrower_not_eligible(
                format!("borrower {} is {}", borrower_id, standing).as_str()))
        }
        None => {
            info!(borrower_id, "unknown borrower");
            Err(LibraryError::borrower_not_eligible(
                format!("borrower {} is not a member", borrower_id).as_str()))
        }
    }
}
