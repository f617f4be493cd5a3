use meal_order_api::{
    db::{create_pool, orm_from_pool, run_migrations},
    entity::{menus, recipes},
    models::{Ingredient, MealSlot, MenuCourse, MenuEntry, RecipeCategory, RecipeIngredient},
};
use sea_orm::{ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

struct SeedRecipe {
    name: &'static str,
    category: RecipeCategory,
    base_price: i64,
    origin: (&'static str, &'static str),
    // (name, unit, quantity per serving, price per unit)
    ingredients: &'static [(&'static str, &'static str, f64, f64)],
}

const RECIPES: &[SeedRecipe] = &[
    SeedRecipe {
        name: "Poulet",
        category: RecipeCategory::Principal,
        base_price: 2000,
        origin: ("Afrique", "Côte d'Ivoire"),
        ingredients: &[
            ("poulet", "kg", 0.5, 3000.0),
            ("oignon", "piece", 1.0, 100.0),
            ("tomate", "piece", 2.0, 75.0),
        ],
    },
    SeedRecipe {
        name: "Riz sauce graine",
        category: RecipeCategory::Principal,
        base_price: 1500,
        origin: ("Afrique", "Côte d'Ivoire"),
        ingredients: &[
            ("riz", "kg", 0.25, 800.0),
            ("graine de palme", "kg", 0.3, 1200.0),
            ("oignon", "piece", 1.0, 100.0),
        ],
    },
    SeedRecipe {
        name: "Alloco",
        category: RecipeCategory::Accompagnement,
        base_price: 500,
        origin: ("Afrique", "Côte d'Ivoire"),
        ingredients: &[("banane plantain", "piece", 1.0, 150.0), ("huile", "l", 0.1, 1500.0)],
    },
    SeedRecipe {
        name: "Salade de fruits",
        category: RecipeCategory::Dessert,
        base_price: 700,
        origin: ("Afrique", "Sénégal"),
        ingredients: &[
            ("mangue", "piece", 0.5, 300.0),
            ("ananas", "piece", 0.25, 800.0),
        ],
    },
    SeedRecipe {
        name: "Bouillie de mil",
        category: RecipeCategory::Entree,
        base_price: 400,
        origin: ("Afrique", "Burkina Faso"),
        ingredients: &[("mil", "kg", 0.1, 900.0), ("lait", "l", 0.2, 1000.0)],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let pool = create_pool(&database_url).await?;
    let orm = orm_from_pool(pool.clone());
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let user_id = ensure_user(&pool, "user@example.com", 4).await?;
    let recipes = seed_recipes(&orm).await?;
    seed_menu(&orm).await?;

    println!("Seed completed. User ID: {user_id}, recipes: {recipes}");
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, family_size: i32) -> anyhow::Result<Uuid> {
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, role, family_size)
        VALUES ($1, $2, 'user', $3)
        ON CONFLICT (email) DO UPDATE SET family_size = EXCLUDED.family_size
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(family_size)
    .fetch_one(pool)
    .await?;

    Ok(user_id)
}

async fn seed_recipes(orm: &sea_orm::DatabaseConnection) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for recipe in RECIPES {
        let exists = recipes::Entity::find()
            .filter(recipes::Column::Name.eq(recipe.name))
            .filter(recipes::Column::OwnerId.is_null())
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let ingredients: Vec<RecipeIngredient> = recipe
            .ingredients
            .iter()
            .map(|(name, unit, quantity, price)| RecipeIngredient {
                ingredient: Ingredient {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    quantity_per_serving: *quantity,
                    price_per_unit: *price,
                },
                quantity: *quantity,
            })
            .collect();

        recipes::Entity::insert(recipes::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(recipe.name.to_string()),
            category: Set(recipe.category.as_str().to_string()),
            ingredients: Set(serde_json::to_value(&ingredients)?),
            base_price: Set(recipe.base_price),
            origin_continent: Set(recipe.origin.0.to_string()),
            origin_country: Set(recipe.origin.1.to_string()),
            is_custom: Set(false),
            is_validated: Set(true),
            owner_id: Set(None),
            created_at: NotSet,
        })
        .exec(orm)
        .await?;
        inserted += 1;
    }

    println!("Seeded recipes");
    Ok(inserted)
}

async fn seed_menu(orm: &sea_orm::DatabaseConnection) -> anyhow::Result<()> {
    let name = "Menu ivoirien";
    let exists = menus::Entity::find()
        .filter(menus::Column::Name.eq(name))
        .one(orm)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }

    let entries = vec![
        MenuEntry {
            course: MenuCourse::Slot(MealSlot::Breakfast),
            recipe_name: "Bouillie de mil".into(),
        },
        MenuEntry {
            course: MenuCourse::Slot(MealSlot::Lunch),
            recipe_name: "Poulet".into(),
        },
        MenuEntry {
            course: MenuCourse::Category(RecipeCategory::Accompagnement),
            recipe_name: "Alloco".into(),
        },
        MenuEntry {
            course: MenuCourse::Category(RecipeCategory::Dessert),
            recipe_name: "Salade de fruits".into(),
        },
    ];

    menus::Entity::insert(menus::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        entries: Set(serde_json::to_value(&entries)?),
        created_at: NotSet,
    })
    .exec(orm)
    .await?;

    println!("Seeded menu");
    Ok(())
}
