use chrono::Utc;
use common::{ChallengeStatus, ChallengeType, InstitutionStatus};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::info;

use crate::entity::{challenge, institution};
use crate::models::course::DEFAULT_MAX_STUDENTS;

/// Id of the education department every deployment starts with.
pub const DEFAULT_INSTITUTION_ID: i32 = 1;

/// Default challenges seeded on startup: (title, description, type, score).
const DEFAULT_CHALLENGES: &[(&str, &str, ChallengeType, i32)] = &[
    (
        "Caminhada Diária",
        "Faça uma caminhada de pelo menos 30 minutos todos os dias por uma semana",
        ChallengeType::Physical,
        150,
    ),
    (
        "Leitura Semanal",
        "Leia pelo menos 1 livro ou 3 artigos educativos durante a semana",
        ChallengeType::Intellectual,
        100,
    ),
];

/// Seed reference data. Safe to run on every startup.
pub async fn run(db: &DatabaseConnection) -> Result<(), DbErr> {
    seed_default_institution(db).await?;
    seed_default_challenges(db).await?;
    Ok(())
}

async fn seed_default_institution(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = Utc::now();
    let model = institution::ActiveModel {
        id: Set(DEFAULT_INSTITUTION_ID),
        name: Set("Secretaria de Educação".to_string()),
        email: Set("contato@secretariaeducacao.gov.br".to_string()),
        phone: Set("(81) 3183-8000".to_string()),
        address: Set(None),
        logo: Set(None),
        description: Set(Some(
            "Secretaria de Educação responsável pela gestão educacional".to_string(),
        )),
        status: Set(InstitutionStatus::Active),
        allow_enrollment: Set(true),
        require_approval: Set(false),
        max_students_per_course: Set(Some(DEFAULT_MAX_STUDENTS)),
        website: Set(Some("https://secretariaeducacao.gov.br".to_string())),
        facebook: Set(Some("secretariaeducacao".to_string())),
        instagram: Set(Some("secretaria_educacao".to_string())),
        linkedin: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let result = institution::Entity::insert(model)
        .on_conflict(
            OnConflict::column(institution::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(id = DEFAULT_INSTITUTION_ID, "Seeded default institution"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    // An explicit id leaves the Postgres sequence behind; move it past the seeded row.
    if db.get_database_backend() == DbBackend::Postgres {
        db.execute_unprepared(
            "SELECT setval(pg_get_serial_sequence('institution', 'id'), \
             GREATEST((SELECT MAX(id) FROM institution), 1))",
        )
        .await?;
    }
    Ok(())
}

async fn seed_default_challenges(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &(title, description, challenge_type, score) in DEFAULT_CHALLENGES {
        let exists = challenge::Entity::find()
            .filter(challenge::Column::Title.eq(title))
            .count(db)
            .await?
            > 0;
        if exists {
            continue;
        }

        let now = Utc::now();
        challenge::ActiveModel {
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            challenge_type: Set(challenge_type),
            status: Set(ChallengeStatus::Active),
            score: Set(score),
            image: Set(None),
            image_banner: Set(None),
            checks: Set(0),
            family_id: Set(None),
            institution_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted += 1;
    }

    if inserted > 0 {
        info!("Seeded {} default challenges", inserted);
    }
    Ok(())
}
