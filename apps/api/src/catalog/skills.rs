use std::collections::HashSet;

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::{AppError, FieldErrors};
use crate::models::catalog::{AttachedSkill, Skill, SkillableType};

/// A skill reference in a request: a bare id, or an id with association metadata.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SkillRef {
    Id(Uuid),
    Detailed {
        skill_id: Uuid,
        proficiency_level: Option<String>,
        years_experience: Option<i32>,
    },
}

impl SkillRef {
    pub fn skill_id(&self) -> Uuid {
        match self {
            SkillRef::Id(id) => *id,
            SkillRef::Detailed { skill_id, .. } => *skill_id,
        }
    }

    fn proficiency_level(&self) -> Option<&str> {
        match self {
            SkillRef::Id(_) => None,
            SkillRef::Detailed {
                proficiency_level, ..
            } => proficiency_level.as_deref(),
        }
    }

    fn years_experience(&self) -> Option<i32> {
        match self {
            SkillRef::Id(_) => None,
            SkillRef::Detailed {
                years_experience, ..
            } => *years_experience,
        }
    }
}

/// Drops repeated ids, keeping the first occurrence.
pub fn dedup_skill_refs(refs: &[SkillRef]) -> Vec<&SkillRef> {
    let mut seen = HashSet::new();
    refs.iter().filter(|r| seen.insert(r.skill_id())).collect()
}

pub fn validate_skill_refs(refs: &[SkillRef], errors: &mut FieldErrors) {
    for r in refs {
        if let Some(years) = r.years_experience() {
            if !(0..=60).contains(&years) {
                errors.add("skills", "years_experience must be between 0 and 60");
                return;
            }
        }
    }
}

/// Replaces the owner's whole skill set. Run inside a transaction.
pub async fn sync_skills(
    conn: &mut PgConnection,
    owner_type: SkillableType,
    owner_id: Uuid,
    refs: &[SkillRef],
) -> Result<(), AppError> {
    let refs = dedup_skill_refs(refs);
    let ids: Vec<Uuid> = refs.iter().map(|r| r.skill_id()).collect();

    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skills WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_one(&mut *conn)
        .await?;
    if known != ids.len() as i64 {
        return Err(AppError::Validation(FieldErrors::single(
            "skills",
            "One or more selected skills do not exist",
        )));
    }

    sqlx::query("DELETE FROM skillables WHERE skillable_type = $1 AND skillable_id = $2")
        .bind(owner_type)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    for r in refs {
        sqlx::query(
            r#"
            INSERT INTO skillables (skill_id, skillable_type, skillable_id, proficiency_level, years_experience)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(r.skill_id())
        .bind(owner_type)
        .bind(owner_id)
        .bind(r.proficiency_level())
        .bind(r.years_experience())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Removes every association of the owner. Used when the owner is deleted.
pub async fn detach_all(
    conn: &mut PgConnection,
    owner_type: SkillableType,
    owner_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM skillables WHERE skillable_type = $1 AND skillable_id = $2")
        .bind(owner_type)
        .bind(owner_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn attached_skills(
    pool: &PgPool,
    owner_type: SkillableType,
    owner_id: Uuid,
) -> Result<Vec<AttachedSkill>, AppError> {
    Ok(sqlx::query_as::<_, AttachedSkill>(
        r#"
        SELECT s.id AS skill_id, s.name, sk.proficiency_level, sk.years_experience
        FROM skillables sk
        JOIN skills s ON s.id = sk.skill_id
        WHERE sk.skillable_type = $1 AND sk.skillable_id = $2
        ORDER BY s.name
        "#,
    )
    .bind(owner_type)
    .bind(owner_id)
    .fetch_all(pool)
    .await?)
}

pub async fn list_skills(pool: &PgPool) -> Result<Vec<Skill>, AppError> {
    Ok(sqlx::query_as::<_, Skill>("SELECT * FROM skills ORDER BY name")
        .fetch_all(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_ref_accepts_bare_id_and_object() {
        let id = Uuid::new_v4();
        let refs: Vec<SkillRef> = serde_json::from_value(serde_json::json!([
            id,
            { "skill_id": id, "proficiency_level": "expert", "years_experience": 4 }
        ]))
        .unwrap();
        assert_eq!(refs[0], SkillRef::Id(id));
        assert_eq!(refs[1].years_experience(), Some(4));
        assert_eq!(refs[1].proficiency_level(), Some("expert"));
    }

    #[test]
    fn test_dedup_keeps_first() {
        let id = Uuid::new_v4();
        let refs = vec![
            SkillRef::Detailed {
                skill_id: id,
                proficiency_level: Some("junior".into()),
                years_experience: None,
            },
            SkillRef::Id(id),
            SkillRef::Id(Uuid::new_v4()),
        ];
        let unique = dedup_skill_refs(&refs);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].proficiency_level(), Some("junior"));
    }

    #[test]
    fn test_years_out_of_range() {
        let mut errors = FieldErrors::new();
        validate_skill_refs(
            &[SkillRef::Detailed {
                skill_id: Uuid::new_v4(),
                proficiency_level: None,
                years_experience: Some(-1),
            }],
            &mut errors,
        );
        assert!(errors.contains("skills"));
    }
}
