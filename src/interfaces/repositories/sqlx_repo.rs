use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxUserRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxTechnologyRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxSkillRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxExternalProfileRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxPermissionRepo {
    pub pool: PgPool,
}
