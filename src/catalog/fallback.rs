use crate::recipe::{Recipe, RecipeId, RecipeProvenance};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn fallback_recipes() -> Vec<Recipe> {
    vec![Recipe {
        id: RecipeId::Numeric(1),
        title: "Butter Chicken".to_string(),
        title_localized: "バターチキン".to_string(),
        cuisine: "Indian".to_string(),
        image: "https://images.unsplash.com/photo-1565557623262-b51c2513a641?w=500".to_string(),
        ingredients: strings(&["chicken", "butter", "tomato", "cream", "spices"]),
        ingredients_localized: strings(&["鶏肉", "バター", "トマト", "クリーム", "スパイス"]),
        instructions: strings(&[
            "Marinate chicken with yogurt and spices",
            "Cook chicken until golden brown",
            "Prepare tomato-based gravy",
            "Combine chicken with gravy and cream",
            "Simmer until sauce thickens",
        ]),
        instructions_localized: strings(&[
            "鶏肉をヨーグルトとスパイスでマリネする",
            "鶏肉を黄金色になるまで調理する",
            "トマトベースのグレービーを準備する",
            "鶏肉とグレービーとクリームを組み合わせる",
            "ソースが濃くなるまで煮込む",
        ]),
        prep_time: "20 mins".to_string(),
        cook_time: "30 mins".to_string(),
        difficulty: "Medium".to_string(),
        provenance: RecipeProvenance::Local,
    }]
}
