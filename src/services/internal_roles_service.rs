// src/services/internal_roles_service.rs

use std::collections::{BTreeMap, HashSet};

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::InternalRepository,
    models::internal::{
        CreateRolePayload, InternalPermission, PermissionModule, RoleResponse, UpdateRolePayload,
    },
};

/// Nome de papel: sem espaços nas pontas e em maiúsculas.
pub fn normalize_role_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim().to_uppercase();
    if name.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("required"));
        return Err(AppError::ValidationError(errors));
    }
    Ok(name)
}

/// Remove ids repetidos mantendo a ordem de chegada.
pub fn dedup_permission_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

pub fn ensure_role_unassigned(assigned_users: i64) -> Result<(), AppError> {
    if assigned_users > 0 {
        return Err(AppError::RoleAssignedToUsers);
    }
    Ok(())
}

pub fn group_by_module(permissions: Vec<InternalPermission>) -> Vec<PermissionModule> {
    let mut modules: BTreeMap<String, Vec<InternalPermission>> = BTreeMap::new();
    for permission in permissions {
        modules.entry(permission.module.clone()).or_default().push(permission);
    }
    modules
        .into_iter()
        .map(|(module, permissions)| PermissionModule { module, permissions })
        .collect()
}

#[derive(Clone)]
pub struct InternalRolesService {
    repo: InternalRepository,
    pool: PgPool,
}

impl InternalRolesService {
    pub fn new(repo: InternalRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // Todos os ids precisam existir; devolve os que faltam
    async fn ensure_permissions_exist(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[Uuid],
    ) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        let found: HashSet<Uuid> = self
            .repo
            .find_permissions_by_ids(&mut **tx, ids)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let missing: Vec<Uuid> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
        if !missing.is_empty() {
            return Err(AppError::UnknownPermissions(missing));
        }
        Ok(())
    }

    // --- CREATE ---
    pub async fn create_role(&self, payload: CreateRolePayload) -> Result<RoleResponse, AppError> {
        let name = normalize_role_name(&payload.name)?;
        let permission_ids = dedup_permission_ids(&payload.permissions);

        let mut tx = self.pool.begin().await?;

        self.ensure_permissions_exist(&mut tx, &permission_ids).await?;

        let role = self
            .repo
            .create_role(&mut *tx, &name, payload.description.as_deref())
            .await?;
        if !permission_ids.is_empty() {
            self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
        }
        let permissions = self.repo.role_permission_slugs(&mut *tx, role.id).await?;

        tx.commit().await?;

        tracing::info!(role_id = %role.id, role = %role.name, permissions = permissions.len(), "🛡️ Papel interno criado");
        Ok(RoleResponse { role, permissions })
    }

    // --- UPDATE ---
    /// Quando `permissions` vem no payload, o conjunto antigo é trocado inteiro
    /// pelo novo. Sem controle de concorrência: o último a gravar vence.
    pub async fn update_role(&self, role_id: Uuid, payload: UpdateRolePayload) -> Result<RoleResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut role = self
            .repo
            .find_role(&mut *tx, role_id)
            .await?
            .ok_or(AppError::RoleNotFound)?;

        if let Some(description) = payload.description.as_deref() {
            role = self
                .repo
                .update_role_description(&mut *tx, role_id, description)
                .await?
                .ok_or(AppError::RoleNotFound)?;
        }

        if let Some(requested) = payload.permissions.as_deref() {
            let permission_ids = dedup_permission_ids(requested);
            self.ensure_permissions_exist(&mut tx, &permission_ids).await?;

            let removed = self.repo.clear_role_permissions(&mut *tx, role_id).await?;
            if !permission_ids.is_empty() {
                self.repo.assign_permissions(&mut *tx, role_id, &permission_ids).await?;
            }
            self.repo.touch_role(&mut *tx, role_id).await?;

            tracing::info!(
                role_id = %role_id,
                removed,
                assigned = permission_ids.len(),
                "🔁 Permissões do papel substituídas"
            );
        }

        let permissions = self.repo.role_permission_slugs(&mut *tx, role_id).await?;
        tx.commit().await?;

        Ok(RoleResponse { role, permissions })
    }

    // --- DELETE ---
    pub async fn delete_role(&self, role_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.repo
            .find_role(&mut *tx, role_id)
            .await?
            .ok_or(AppError::RoleNotFound)?;

        let assigned = self.repo.count_role_users(&mut *tx, role_id).await?;
        ensure_role_unassigned(assigned)?;

        // A FK de internal_users ainda barra uma atribuição feita entre a contagem e o DELETE
        self.repo.delete_role(&mut *tx, role_id).await.map_err(|e| match e {
            AppError::DatabaseError(ref db_err)
                if db_err.as_database_error().is_some_and(|d| d.is_foreign_key_violation()) =>
            {
                AppError::RoleAssignedToUsers
            }
            other => other,
        })?;

        tx.commit().await?;

        tracing::info!(role_id = %role_id, "🗑️ Papel interno removido");
        Ok(())
    }

    // --- READ ---
    pub async fn get_role(&self, role_id: Uuid) -> Result<RoleResponse, AppError> {
        let role = self
            .repo
            .find_role(&self.pool, role_id)
            .await?
            .ok_or(AppError::RoleNotFound)?;
        let permissions = self.repo.role_permission_slugs(&self.pool, role_id).await?;
        Ok(RoleResponse { role, permissions })
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_roles().await?;

        let mut response = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.repo.role_permission_slugs(&self.pool, role.id).await?;
            response.push(RoleResponse { role, permissions });
        }
        Ok(response)
    }

    pub async fn list_permissions(&self) -> Result<Vec<PermissionModule>, AppError> {
        let permissions = self.repo.list_all_permissions().await?;
        Ok(group_by_module(permissions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(slug: &str, module: &str) -> InternalPermission {
        InternalPermission {
            id: Uuid::new_v4(),
            slug: slug.into(),
            description: slug.into(),
            module: module.into(),
        }
    }

    #[test]
    fn role_name_is_trimmed_and_uppercased() {
        assert_eq!(normalize_role_name("  suporte nível 1 ").unwrap(), "SUPORTE NÍVEL 1");
    }

    #[test]
    fn blank_role_name_is_a_validation_error() {
        let err = normalize_role_name("   ").unwrap_err();
        match err {
            AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("name")),
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn duplicate_permission_ids_are_dropped_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_permission_ids(&[a, b, a, b, a]), vec![a, b]);
        assert!(dedup_permission_ids(&[]).is_empty());
    }

    #[test]
    fn role_with_users_cannot_be_deleted() {
        assert!(ensure_role_unassigned(0).is_ok());
        assert!(matches!(ensure_role_unassigned(1), Err(AppError::RoleAssignedToUsers)));
    }

    #[test]
    fn permissions_are_grouped_by_module_in_order() {
        let grouped = group_by_module(vec![
            permission("internal:leads", "CRM"),
            permission("internal:roles", "ADMIN"),
            permission("internal:users", "ADMIN"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].module, "ADMIN");
        assert_eq!(grouped[0].permissions.len(), 2);
        assert_eq!(grouped[1].module, "CRM");
    }

    // ---
    // Testes contra Postgres real
    // ---

    mod db {
        use super::*;

        fn service(pool: &PgPool) -> InternalRolesService {
            InternalRolesService::new(InternalRepository::new(pool.clone()), pool.clone())
        }

        async fn permission_ids(pool: &PgPool, slugs: &[&str]) -> Vec<Uuid> {
            let slugs: Vec<String> = slugs.iter().map(|s| s.to_string()).collect();
            sqlx::query_scalar("SELECT id FROM internal_permissions WHERE slug = ANY($1) ORDER BY slug")
                .bind(&slugs)
                .fetch_all(pool)
                .await
                .unwrap()
        }

        fn create_payload(name: &str, permissions: Vec<Uuid>) -> CreateRolePayload {
            CreateRolePayload { name: name.into(), description: None, permissions }
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn replacing_permissions_leaves_exactly_the_new_set(pool: PgPool) {
            let svc = service(&pool);
            let initial = permission_ids(&pool, &["internal:roles", "internal:users"]).await;
            let role = svc.create_role(create_payload("suporte", initial)).await.unwrap();
            assert_eq!(role.role.name, "SUPORTE");
            assert_eq!(role.permissions, vec!["internal:roles", "internal:users"]);

            let leads = permission_ids(&pool, &["internal:leads"]).await;
            let updated = svc
                .update_role(
                    role.role.id,
                    UpdateRolePayload { description: None, permissions: Some(vec![leads[0], leads[0]]) },
                )
                .await
                .unwrap();

            assert_eq!(updated.permissions, vec!["internal:leads"]);
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn unknown_permission_rolls_back_the_replacement(pool: PgPool) {
            let svc = service(&pool);
            let initial = permission_ids(&pool, &["internal:roles"]).await;
            let role = svc.create_role(create_payload("auditor", initial)).await.unwrap();

            let bogus = Uuid::new_v4();
            let err = svc
                .update_role(role.role.id, UpdateRolePayload { description: None, permissions: Some(vec![bogus]) })
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::UnknownPermissions(ref ids) if ids == &vec![bogus]));
            assert_eq!(svc.get_role(role.role.id).await.unwrap().permissions, vec!["internal:roles"]);
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn role_names_are_unique_ignoring_case(pool: PgPool) {
            let svc = service(&pool);
            svc.create_role(create_payload("financeiro", vec![])).await.unwrap();

            let err = svc.create_role(create_payload(" Financeiro ", vec![])).await.unwrap_err();
            assert!(matches!(err, AppError::RoleNameAlreadyExists(_)));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn assigned_role_survives_delete_attempt(pool: PgPool) {
            let svc = service(&pool);
            let role = svc.create_role(create_payload("vendas", vec![])).await.unwrap();

            let user_id: Uuid = sqlx::query_scalar(
                "INSERT INTO users (email, password_hash) VALUES ('vendas@empresa.com', 'x') RETURNING id",
            )
            .fetch_one(&pool)
            .await
            .unwrap();
            sqlx::query("INSERT INTO internal_users (user_id, name, role_id) VALUES ($1, 'Ana', $2)")
                .bind(user_id)
                .bind(role.role.id)
                .execute(&pool)
                .await
                .unwrap();

            let err = svc.delete_role(role.role.id).await.unwrap_err();
            assert!(matches!(err, AppError::RoleAssignedToUsers));
            assert!(svc.get_role(role.role.id).await.is_ok());
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn unassigned_role_is_deleted(pool: PgPool) {
            let svc = service(&pool);
            let role = svc.create_role(create_payload("temporario", vec![])).await.unwrap();

            svc.delete_role(role.role.id).await.unwrap();

            assert!(matches!(svc.get_role(role.role.id).await, Err(AppError::RoleNotFound)));
            assert!(matches!(svc.delete_role(role.role.id).await, Err(AppError::RoleNotFound)));
        }
    }
}
