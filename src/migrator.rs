use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_companies_table::Migration),
            Box::new(m20240601_000002_create_products_table::Migration),
            Box::new(m20240601_000003_create_damage_records_table::Migration),
            Box::new(m20240615_000004_create_id_sequences_table::Migration),
        ]
    }
}

mod m20240601_000001_create_companies_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_companies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Companies::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_companies_name")
                        .table(Companies::Table)
                        .col(Companies::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Companies {
        Table,
        Id,
        Name,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::CompanyId).string().not_null())
                        .col(ColumnDef::new(Products::Details).json().not_null())
                        .col(
                            ColumnDef::new(Products::TotalQuantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            // One product per (company, name)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_company_id_name")
                        .table(Products::Table)
                        .col(Products::CompanyId)
                        .col(Products::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        CompanyId,
        Details,
        TotalQuantity,
    }
}

mod m20240601_000003_create_damage_records_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_damage_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DamageRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DamageRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DamageRecords::ProductId).string().not_null())
                        .col(ColumnDef::new(DamageRecords::CompanyId).string().not_null())
                        .col(
                            ColumnDef::new(DamageRecords::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DamageRecords::UnitPrice).string().not_null())
                        .col(ColumnDef::new(DamageRecords::Expiry).date().not_null())
                        .col(
                            ColumnDef::new(DamageRecords::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(DamageRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_damage_records_company_id")
                        .table(DamageRecords::Table)
                        .col(DamageRecords::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DamageRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DamageRecords {
        Table,
        Id,
        ProductId,
        CompanyId,
        Quantity,
        UnitPrice,
        Expiry,
        Deleted,
        CreatedAt,
    }
}

mod m20240615_000004_create_id_sequences_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240615_000004_create_id_sequences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(IdSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IdSequences::Prefix)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IdSequences::HighWater)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(IdSequences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum IdSequences {
        Table,
        Prefix,
        HighWater,
    }
}
