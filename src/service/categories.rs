use crate::{
    error::{AppError, AppResult},
    models::{
        Category, CreateCategoryRequest, UpdateCategoryRequest, non_empty, validate_category_name,
    },
    repository::CategoryRepositoryState,
};

#[derive(Clone)]
pub struct CategoryService {
    categories: CategoryRepositoryState,
}

impl CategoryService {
    pub fn new(categories: CategoryRepositoryState) -> Self {
        Self { categories }
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.categories.list_categories().await
    }

    pub async fn get_category(&self, id: i64) -> AppResult<Category> {
        self.categories
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::not_found("category not found"))
    }

    pub async fn create_category(&self, req: CreateCategoryRequest) -> AppResult<Category> {
        req.validate()?;
        let category = self
            .categories
            .create_category(req.name.trim(), req.description.trim())
            .await?;
        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// update_category
    ///
    /// Blank fields are left as they are. The post counter is never written
    /// here.
    pub async fn update_category(
        &self,
        id: i64,
        req: UpdateCategoryRequest,
    ) -> AppResult<Category> {
        let name = non_empty(req.name).map(|n| n.trim().to_string());
        if let Some(name) = &name {
            validate_category_name(name)?;
        }

        self.categories
            .update_category(id, name, non_empty(req.description))
            .await?
            .ok_or_else(|| AppError::not_found("category not found"))
    }

    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        if !self.categories.delete_category(id).await? {
            return Err(AppError::not_found("category not found"));
        }
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }
}
