use tracing::error;

use super::{
    items::PlanItem,
    repo::{NewPlan, Plan, PlanRepository},
};
use crate::{
    assignments::AssignmentRegistry, auth::policy::require_admin, db::Store, error::AppError,
    users::repo_types::User,
};

/// Creates a plan on behalf of `admin` and adds the admin → client edge if missing.
///
/// The plan row is written before the edge and the two steps are not atomic.
/// If the edge insert fails the plan stays and the error is returned.
pub async fn create_for_client<I: PlanItem>(
    store: &dyn Store,
    admin: &User,
    new: NewPlan<I>,
) -> Result<Plan<I>, AppError> {
    require_admin(admin, &format!("create {}s", I::KIND.label()))?;

    let client_id = new.owner_id;
    let plan = PlanRepository::<I>::new(store).create(new).await?;

    let registry = AssignmentRegistry::new(store);
    let linked = match registry.is_assigned(admin.id, client_id).await {
        Ok(true) => Ok(()),
        Ok(false) => registry.link(admin, client_id).await.map(|_| ()),
        Err(e) => Err(e),
    };
    linked.map_err(|e| {
        error!(plan_id = plan.id, admin_id = admin.id, client_id, error = %e, "plan stored but assignment failed");
        e
    })?;

    Ok(plan)
}
