use anyhow::Result;
use sqlx::PgPool;

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Running PostgreSQL migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS colleges (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            id BIGSERIAL PRIMARY KEY,
            college_id BIGINT NOT NULL REFERENCES colleges(id) ON DELETE CASCADE,
            name VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (college_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id BIGSERIAL PRIMARY KEY,
            student_id_number VARCHAR(50) NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            department_id BIGINT NOT NULL REFERENCES departments(id) ON DELETE RESTRICT,
            grade SMALLINT,
            program_level VARCHAR(10) NOT NULL,
            status VARCHAR(10) NOT NULL,
            gender VARCHAR(10),
            admission_year INTEGER,
            advisor_name VARCHAR(100),
            email VARCHAR(254) UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS department_kpis (
            id BIGSERIAL PRIMARY KEY,
            department_id BIGINT NOT NULL REFERENCES departments(id) ON DELETE CASCADE,
            evaluation_year INTEGER NOT NULL,
            employment_rate DOUBLE PRECISION,
            full_time_faculty_count INTEGER,
            visiting_faculty_count INTEGER,
            tech_transfer_income DOUBLE PRECISION,
            international_conferences_count INTEGER,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (department_id, evaluation_year)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS publications (
            id BIGSERIAL PRIMARY KEY,
            publication_id_str VARCHAR(100) UNIQUE,
            publication_date DATE NOT NULL,
            department_id BIGINT NOT NULL REFERENCES departments(id) ON DELETE RESTRICT,
            title TEXT NOT NULL,
            primary_author VARCHAR(100),
            contributing_authors TEXT,
            journal_name TEXT,
            journal_rank VARCHAR(50),
            impact_factor DOUBLE PRECISION,
            is_project_linked BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS research_projects (
            id BIGSERIAL PRIMARY KEY,
            project_number VARCHAR(100) NOT NULL UNIQUE,
            name TEXT NOT NULL,
            principal_investigator VARCHAR(100),
            department_id BIGINT NOT NULL REFERENCES departments(id) ON DELETE RESTRICT,
            funding_agency VARCHAR(255),
            total_funding_amount BIGINT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_expenses (
            id BIGSERIAL PRIMARY KEY,
            execution_id VARCHAR(100) NOT NULL UNIQUE,
            project_id BIGINT NOT NULL REFERENCES research_projects(id) ON DELETE CASCADE,
            execution_date DATE NOT NULL,
            item VARCHAR(255) NOT NULL,
            amount BIGINT NOT NULL,
            status VARCHAR(20) NOT NULL,
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_departments_college_id ON departments(college_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_department_id ON students(department_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_status ON students(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_publications_department_id ON publications(department_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_publications_date ON publications(publication_date)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_research_projects_department_id ON research_projects(department_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_project_expenses_project_id ON project_expenses(project_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_project_expenses_status ON project_expenses(status)")
        .execute(pool)
        .await?;

    tracing::info!("PostgreSQL migrations completed successfully");
    Ok(())
}
