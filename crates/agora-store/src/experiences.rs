//! CRUD operations for [`Experience`] records and their post membership.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::codec::{new_id, opt_ts, or_not_found, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{Experience, ExperiencePost, NewExperience};

impl Database {
    pub fn create_experience(&self, new: &NewExperience) -> Result<Experience> {
        let experience = Experience {
            id: new_id(),
            name: new.name.clone(),
            description: new.description.clone(),
            created_by: new.created_by.clone(),
            created_at: Utc::now(),
            deleted_at: None,
        };

        self.conn().execute(
            "INSERT INTO experiences (id, name, description, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                experience.id,
                experience.name,
                experience.description,
                experience.created_by,
                experience.created_at.to_rfc3339(),
            ],
        )?;
        Ok(experience)
    }

    pub fn get_experience(&self, id: &str) -> Result<Experience> {
        self.conn()
            .query_row(
                "SELECT id, name, description, created_by, created_at, deleted_at
                 FROM experiences WHERE id = ?1",
                params![id],
                |row| {
                    let created_at: String = row.get(4)?;
                    Ok(Experience {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        created_by: row.get(3)?,
                        created_at: ts(4, &created_at)?,
                        deleted_at: opt_ts(5, row.get(5)?)?,
                    })
                },
            )
            .map_err(or_not_found("Experience", id))
    }

    pub fn count_experiences_by(&self, user_id: &str) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM experiences WHERE created_by = ?1 AND deleted_at IS NULL",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    pub fn find_experience_post(
        &self,
        experience_id: &str,
        post_id: &str,
    ) -> Result<Option<ExperiencePost>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, experience_id, post_id, created_at FROM experience_posts
                 WHERE experience_id = ?1 AND post_id = ?2",
                params![experience_id, post_id],
                |row| {
                    let created_at: String = row.get(3)?;
                    Ok(ExperiencePost {
                        id: row.get(0)?,
                        experience_id: row.get(1)?,
                        post_id: row.get(2)?,
                        created_at: ts(3, &created_at)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn create_experience_post(
        &self,
        experience_id: &str,
        post_id: &str,
    ) -> Result<ExperiencePost> {
        let link = ExperiencePost {
            id: new_id(),
            experience_id: experience_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO experience_posts (id, experience_id, post_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                link.id,
                link.experience_id,
                link.post_id,
                link.created_at.to_rfc3339()
            ],
        )?;
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPost;
    use crate::StoreError;
    use agora_shared::{PlatformType, PostStatus};

    #[test]
    fn test_post_joins_experience_once() {
        let db = Database::open_in_memory().unwrap();
        let experience = db
            .create_experience(&NewExperience {
                name: "Rustaceans".to_string(),
                description: None,
                created_by: "alice".to_string(),
            })
            .unwrap();
        let post = db
            .create_post(&NewPost {
                created_by: "alice".to_string(),
                text: "hi".to_string(),
                platform: PlatformType::Agora,
                status: PostStatus::Published,
                original_post_id: None,
                url: None,
                tags: vec![],
                mentions: vec![],
            })
            .unwrap();

        assert!(db
            .find_experience_post(&experience.id, &post.id)
            .unwrap()
            .is_none());
        db.create_experience_post(&experience.id, &post.id).unwrap();
        assert!(db
            .find_experience_post(&experience.id, &post.id)
            .unwrap()
            .is_some());

        let err = db
            .create_experience_post(&experience.id, &post.id)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(db.count_experiences_by("alice").unwrap(), 1);
    }
}
