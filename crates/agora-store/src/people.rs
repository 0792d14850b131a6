//! Imported identities ([`People`]) and the social accounts users claim.

use chrono::Utc;
use rusqlite::params;

use crate::codec::{enum_col, new_id, or_not_found, ts};
use crate::database::Database;
use crate::error::Result;
use crate::models::{NewPeople, NewUserSocialMedia, People, UserSocialMedia};

impl Database {
    pub fn create_people(&self, new: &NewPeople) -> Result<People> {
        let people = People {
            id: new_id(),
            name: new.name.clone(),
            username: new.username.clone(),
            platform: new.platform,
            origin_user_id: new.origin_user_id.clone(),
            user_id: None,
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO people (id, name, username, platform, origin_user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                people.id,
                people.name,
                people.username,
                people.platform.as_str(),
                people.origin_user_id,
                people.created_at.to_rfc3339(),
            ],
        )?;
        Ok(people)
    }

    pub fn get_people(&self, id: &str) -> Result<People> {
        self.conn()
            .query_row(
                "SELECT id, name, username, platform, origin_user_id, user_id, created_at
                 FROM people WHERE id = ?1",
                params![id],
                |row| {
                    let platform: String = row.get(3)?;
                    let created_at: String = row.get(6)?;
                    Ok(People {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        username: row.get(2)?,
                        platform: enum_col(3, &platform)?,
                        origin_user_id: row.get(4)?,
                        user_id: row.get(5)?,
                        created_at: ts(6, &created_at)?,
                    })
                },
            )
            .map_err(or_not_found("People", id))
    }

    /// Record that `user_id` owns the imported identity.
    pub fn link_people_to_user(&self, people_id: &str, user_id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE people SET user_id = ?1 WHERE id = ?2",
            params![user_id, people_id],
        )?;
        Ok(())
    }

    pub fn create_user_social_media(&self, new: &NewUserSocialMedia) -> Result<UserSocialMedia> {
        let social = UserSocialMedia {
            id: new_id(),
            user_id: new.user_id.clone(),
            people_id: new.people_id.clone(),
            platform: new.platform,
            verified: new.verified,
            primary: new.primary,
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO user_social_medias (id, user_id, people_id, platform, verified,
                                             is_primary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                social.id,
                social.user_id,
                social.people_id,
                social.platform.as_str(),
                social.verified,
                social.primary,
                social.created_at.to_rfc3339(),
            ],
        )?;
        Ok(social)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_shared::PlatformType;

    #[test]
    fn test_link_imported_identity() {
        let db = Database::open_in_memory().unwrap();
        let people = db
            .create_people(&NewPeople {
                name: "Alice".to_string(),
                username: "alice".to_string(),
                platform: PlatformType::Twitter,
                origin_user_id: "tw-1".to_string(),
            })
            .unwrap();
        assert!(people.user_id.is_none());

        db.link_people_to_user(&people.id, "u1").unwrap();
        assert_eq!(db.get_people(&people.id).unwrap().user_id.as_deref(), Some("u1"));
    }
}
