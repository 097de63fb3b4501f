use anyhow::anyhow;
use std::path::PathBuf;
use std::sync::Arc;

use recipe_assistant_rust::catalog::{self, CatalogStore, MemoryCatalog};
use recipe_assistant_rust::external::{ExternalMeal, RecipeSource, SourceFuture};
use recipe_assistant_rust::lexicon::Lexicon;
use recipe_assistant_rust::recipe::{RecipeId, RecipeProvenance, SourceLabel};
use recipe_assistant_rust::resolver::{RecipeResolver, SearchQuery};

struct FixtureSource {
    filter: Vec<ExternalMeal>,
    lookup: Option<ExternalMeal>,
    fail: bool,
}

impl RecipeSource for FixtureSource {
    fn filter_by_ingredient<'a>(&'a self, _term: &'a str) -> SourceFuture<'a, Vec<ExternalMeal>> {
        Box::pin(async move {
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(self.filter.clone())
        })
    }

    fn lookup_by_id<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Option<ExternalMeal>> {
        Box::pin(async move {
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(self.lookup.clone().filter(|meal| meal.id == id))
        })
    }
}

fn bundled_catalog() -> Arc<MemoryCatalog> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/recipes.json");
    let store = Arc::new(MemoryCatalog::new());
    let seeded = catalog::seed_if_empty(store.as_ref(), &path).expect("seed");
    assert_eq!(seeded, 8);
    store
}

fn meals(count: usize) -> Vec<ExternalMeal> {
    (0..count)
        .map(|index| ExternalMeal::new(format!("{}", 52000 + index), format!("Meal {}", index)))
        .collect()
}

#[tokio::test]
async fn japanese_synonyms_reach_the_bundled_catalog() {
    let lexicon = Lexicon::load().expect("lexicon");
    let resolver = RecipeResolver::new(bundled_catalog());

    let by_kanji = resolver
        .search(&SearchQuery::parse(&lexicon, "鶏肉"), false)
        .await;
    let by_katakana = resolver
        .search(&SearchQuery::parse(&lexicon, "丸鶏"), false)
        .await;
    let by_english = resolver
        .search(&SearchQuery::parse(&lexicon, "Chicken"), false)
        .await;

    assert!(by_kanji.local_count > 0);
    assert_eq!(by_kanji.recipes, by_katakana.recipes);
    assert_eq!(by_kanji.recipes, by_english.recipes);
    assert_eq!(by_kanji.source_label(), SourceLabel::Local);
}

#[tokio::test]
async fn mixed_search_appends_external_recipes() {
    let lexicon = Lexicon::load().expect("lexicon");
    let resolver = RecipeResolver::new(bundled_catalog()).with_source(Arc::new(FixtureSource {
        filter: meals(8),
        lookup: None,
        fail: false,
    }));

    let result = resolver
        .search(&SearchQuery::parse(&lexicon, "Chicken, 米"), true)
        .await;

    assert_eq!(result.source_label(), SourceLabel::Mixed);
    assert_eq!(result.external_count, 5);
    assert_eq!(result.local_count + result.external_count, result.recipes.len());
    let first_external = &result.recipes[result.local_count];
    assert_eq!(first_external.id, RecipeId::Text("ext_52000".to_string()));
    assert_eq!(first_external.ingredients, ["chicken"]);
    assert_eq!(first_external.ingredients_localized, ["Chicken"]);
    assert_eq!(first_external.provenance, RecipeProvenance::External);
    assert!(
        result.recipes[..result.local_count]
            .iter()
            .all(|recipe| recipe.provenance == RecipeProvenance::Local)
    );
}

#[tokio::test]
async fn external_outage_degrades_to_local_results() {
    let lexicon = Lexicon::load().expect("lexicon");
    let resolver = RecipeResolver::new(bundled_catalog()).with_source(Arc::new(FixtureSource {
        filter: meals(3),
        lookup: None,
        fail: true,
    }));

    let result = resolver
        .search(&SearchQuery::parse(&lexicon, "tomato"), true)
        .await;
    assert_eq!(result.external_count, 0);
    assert_eq!(result.source_label(), SourceLabel::Local);
    assert!(resolver.find_by_id("ext_52772").await.is_none());
}

#[tokio::test]
async fn unknown_numeric_id_falls_through_to_external_lookup() {
    let resolver = RecipeResolver::new(bundled_catalog()).with_source(Arc::new(FixtureSource {
        filter: Vec::new(),
        lookup: Some(
            ExternalMeal::new("999", "Mystery Stew")
                .with_instructions("Step1\n\nStep2\n")
                .with_ingredient(1, " Beef ")
                .with_ingredient(2, "")
                .with_ingredient(3, "Carrot"),
        ),
        fail: false,
    }));

    let recipe = resolver.find_by_id("999").await.expect("recipe");
    assert_eq!(recipe.id, RecipeId::Text("999".to_string()));
    assert_eq!(recipe.instructions, ["Step1", "Step2"]);
    assert_eq!(recipe.ingredients, ["Beef", "Carrot"]);
    assert_eq!(recipe.prep_time, "N/A");

    let local = resolver.find_by_id("1").await.expect("local recipe");
    assert_eq!(local.provenance, RecipeProvenance::Local);
    assert_eq!(local.title, "Butter Chicken");
}

#[test]
fn reload_replaces_catalog_contents() {
    let store = bundled_catalog();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recipes.json");
    std::fs::write(
        &path,
        r#"[{"id": 42, "title": "Masala Chai", "title_jp": "マサラチャイ", "ingredients": ["tea", "milk"], "ingredients_jp": ["紅茶", "牛乳"], "source": "external"}]"#,
    )
    .expect("write");

    let count = catalog::reload(store.as_ref(), &path).expect("reload");
    assert_eq!(count, 1);
    let recipes = store.all().expect("recipes");
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].provenance, RecipeProvenance::Local);
}
