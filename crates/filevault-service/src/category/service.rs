//! Global and per-user file categories.

use std::sync::Arc;

use tracing::info;

use filevault_auth::ownership::require_owned;
use filevault_core::error::AppError;
use filevault_database::repositories::CategoryRepository;
use filevault_entity::category::{Category, CreateCategory};

use crate::context::RequestContext;
use crate::validation::normalize_name;

/// Manages categories. Global categories are shared read-only; users
/// manage only their own.
#[derive(Debug, Clone)]
pub struct CategoryService {
    /// Category repository.
    category_repo: Arc<CategoryRepository>,
}

impl CategoryService {
    /// Creates a new category service.
    pub fn new(category_repo: Arc<CategoryRepository>) -> Self {
        Self { category_repo }
    }

    /// Creates a private category for the caller.
    pub async fn create_category(&self, ctx: &RequestContext, name: &str) -> Result<Category, AppError> {
        let name = normalize_name("Category", name)?;
        let category = self
            .category_repo
            .create(&CreateCategory {
                name,
                user_id: Some(ctx.user_id),
            })
            .await?;

        info!(user_id = ctx.user_id, category_id = category.id, "Category created");
        Ok(category)
    }

    /// Creates a category shared by every user.
    pub async fn create_global_category(&self, name: &str) -> Result<Category, AppError> {
        let name = normalize_name("Category", name)?;
        let category = self
            .category_repo
            .create(&CreateCategory {
                name,
                user_id: None,
            })
            .await?;

        info!(category_id = category.id, "Global category created");
        Ok(category)
    }

    /// Lists global categories and the caller's own, by name.
    pub async fn list_categories(&self, ctx: &RequestContext) -> Result<Vec<Category>, AppError> {
        self.category_repo.find_visible(ctx.user_id).await
    }

    /// Lists global categories only.
    pub async fn list_global_categories(&self) -> Result<Vec<Category>, AppError> {
        self.category_repo.find_global().await
    }

    /// Renames one of the caller's categories.
    pub async fn rename_category(
        &self,
        ctx: &RequestContext,
        category_id: i64,
        new_name: &str,
    ) -> Result<Category, AppError> {
        require_owned(
            self.category_repo.find_by_id(category_id).await?,
            ctx.user_id,
            "Category",
            category_id,
        )?;
        let name = normalize_name("Category", new_name)?;

        let category = self.category_repo.rename(category_id, &name).await?;
        info!(user_id = ctx.user_id, category_id, "Category renamed");
        Ok(category)
    }

    /// Deletes one of the caller's categories. Its files become
    /// uncategorized.
    pub async fn delete_category(&self, ctx: &RequestContext, category_id: i64) -> Result<(), AppError> {
        require_owned(
            self.category_repo.find_by_id(category_id).await?,
            ctx.user_id,
            "Category",
            category_id,
        )?;

        self.category_repo.delete(category_id).await?;
        info!(user_id = ctx.user_id, category_id, "Category deleted");
        Ok(())
    }
}
