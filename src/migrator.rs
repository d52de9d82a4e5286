use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_resource_types_table::Migration),
            Box::new(m20240901_000002_create_employees_table::Migration),
            Box::new(m20240901_000003_create_resources_table::Migration),
            Box::new(m20240901_000004_create_allocations_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240901_000001_create_resource_types_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000001_create_resource_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ResourceTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ResourceTypes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ResourceTypes::Name).string().not_null())
                        .col(ColumnDef::new(ResourceTypes::Description).string().null())
                        .col(
                            ColumnDef::new(ResourceTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ResourceTypes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ResourceTypes::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ResourceTypes {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240901_000002_create_employees_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000002_create_employees_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Employees::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Employees::Name).string().not_null())
                        .col(
                            ColumnDef::new(Employees::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Employees::PasswordHash).string().null())
                        .col(
                            ColumnDef::new(Employees::Role)
                                .string()
                                .not_null()
                                .default("employee"),
                        )
                        .col(ColumnDef::new(Employees::Position).string().null())
                        .col(ColumnDef::new(Employees::Department).string().null())
                        .col(ColumnDef::new(Employees::Status).string().null())
                        .col(ColumnDef::new(Employees::EmployeeCode).string().null())
                        .col(ColumnDef::new(Employees::Phone).string().null())
                        .col(ColumnDef::new(Employees::Birthday).string().null())
                        .col(
                            ColumnDef::new(Employees::HireDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Employees::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Employees::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Employees::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Employees {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        Role,
        Position,
        Department,
        Status,
        EmployeeCode,
        Phone,
        Birthday,
        HireDate,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240901_000003_create_resources_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000003_create_resources_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Resources::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Resources::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Resources::Name).string().not_null())
                        .col(ColumnDef::new(Resources::ResourceTypeId).uuid().not_null())
                        .col(ColumnDef::new(Resources::Description).string().null())
                        .col(ColumnDef::new(Resources::Brand).string().null())
                        .col(ColumnDef::new(Resources::ModelName).string().null())
                        .col(ColumnDef::new(Resources::SerialNumber).string().null())
                        .col(ColumnDef::new(Resources::AssetTag).string().null())
                        .col(ColumnDef::new(Resources::VendorName).string().null())
                        .col(ColumnDef::new(Resources::PurchaseCost).decimal().null())
                        .col(
                            ColumnDef::new(Resources::PurchaseDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Resources::WarrantyExpiryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Resources::LastServiceDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Resources::TotalResourceCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Resources::AvailableResourceCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Resources::Status)
                                .string()
                                .not_null()
                                .default("Available"),
                        )
                        .col(
                            ColumnDef::new(Resources::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Resources::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Resources::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_resources_resource_type")
                                .from(Resources::Table, Resources::ResourceTypeId)
                                .to(ResourceTypes::Table, ResourceTypes::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_resources_serial_number")
                        .table(Resources::Table)
                        .col(Resources::SerialNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Resources::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Resources {
        Table,
        Id,
        Name,
        ResourceTypeId,
        Description,
        Brand,
        ModelName,
        SerialNumber,
        AssetTag,
        VendorName,
        PurchaseCost,
        PurchaseDate,
        WarrantyExpiryDate,
        LastServiceDate,
        TotalResourceCount,
        AvailableResourceCount,
        Status,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ResourceTypes {
        Table,
        Id,
    }
}

mod m20240901_000004_create_allocations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000004_create_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Allocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Allocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Allocations::ResourceId).uuid().not_null())
                        .col(ColumnDef::new(Allocations::EmployeeId).uuid().not_null())
                        .col(
                            ColumnDef::new(Allocations::AllocatedDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Allocations::ReturnDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Allocations::Status)
                                .string()
                                .not_null()
                                .default("Allocated"),
                        )
                        .col(ColumnDef::new(Allocations::Notes).string().null())
                        .col(
                            ColumnDef::new(Allocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Allocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_resource")
                                .from(Allocations::Table, Allocations::ResourceId)
                                .to(Resources::Table, Resources::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_employee")
                                .from(Allocations::Table, Allocations::EmployeeId)
                                .to(Employees::Table, Employees::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_allocations_resource_id")
                        .table(Allocations::Table)
                        .col(Allocations::ResourceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_allocations_employee_id")
                        .table(Allocations::Table)
                        .col(Allocations::EmployeeId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Allocations::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Allocations {
        Table,
        Id,
        ResourceId,
        EmployeeId,
        AllocatedDate,
        ReturnDate,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Resources {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Employees {
        Table,
        Id,
    }
}
