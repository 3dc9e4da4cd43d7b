//! User repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use super::Pagination;
use crate::model::{NewUser, Role, UpdateUser, User};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for user database operations.
pub trait UserRepository {
    /// Inserts a new user.
    ///
    /// Fails with the `users_email_key` constraint if the email is taken.
    fn create_user(&mut self, new_user: NewUser) -> impl Future<Output = PgResult<User>> + Send;

    /// Finds a user by id.
    fn find_user_by_id(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Finds a user by email. The lookup normalizes the address first.
    fn find_user_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Finds a user together with the role row it references.
    ///
    /// The role is `None` when the reference dangles.
    fn find_user_with_role(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<(User, Option<Role>)>>> + Send;

    /// Applies a partial update. Returns `None` if the user does not exist.
    fn update_user(
        &mut self,
        user_id: Uuid,
        updates: UpdateUser,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Deletes a user, returning whether a row was removed.
    fn delete_user(&mut self, user_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;

    /// Lists users, oldest first.
    fn list_users(
        &mut self,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<User>>> + Send;

    /// Counts the users assigned to a role.
    fn count_users_with_role(&mut self, role_id: Uuid)
    -> impl Future<Output = PgResult<i64>> + Send;
}

impl UserRepository for PgConnection {
    async fn create_user(&mut self, mut new_user: NewUser) -> PgResult<User> {
        use schema::users;

        new_user.email = new_user.email.trim().to_lowercase();
        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_user_by_id(&mut self, user_id: Uuid) -> PgResult<Option<User>> {
        use schema::users;

        users::table
            .find(user_id)
            .select(User::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_user_by_email(&mut self, email: &str) -> PgResult<Option<User>> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::email.eq(email.trim().to_lowercase()))
            .select(User::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_user_with_role(&mut self, user_id: Uuid) -> PgResult<Option<(User, Option<Role>)>> {
        use schema::{roles, users};

        users::table
            .left_join(roles::table)
            .filter(users::id.eq(user_id))
            .select((User::as_select(), Option::<Role>::as_select()))
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn update_user(&mut self, user_id: Uuid, mut updates: UpdateUser) -> PgResult<Option<User>> {
        use schema::users;

        if let Some(email) = updates.email.as_mut() {
            *email = email.trim().to_lowercase();
        }
        if let Some(name) = updates.full_name.as_mut() {
            *name = name.trim().to_owned();
        }
        updates.updated_at = Some(jiff_diesel::Timestamp::from(Timestamp::now()));

        diesel::update(users::table.find(user_id))
            .set(&updates)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn delete_user(&mut self, user_id: Uuid) -> PgResult<bool> {
        use schema::users;

        let deleted = diesel::delete(users::table.find(user_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    async fn list_users(&mut self, pagination: Pagination) -> PgResult<Vec<User>> {
        use schema::users::{self, dsl};

        users::table
            .order(dsl::created_at.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(User::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn count_users_with_role(&mut self, role_id: Uuid) -> PgResult<i64> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::role_id.eq(role_id))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)
    }
}
