#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{PathItemType, RefOr, schema::Schema};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{name} should be an object schema"),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));
        assert!(components.schemas.contains_key("AggregationReport"));

        let json_result = serde_json::to_string(&openapi);
        assert!(json_result.is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["error", "code", "success", "details"] {
            assert!(properties.iter().any(|p| p == field), "missing {field}");
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");
        for field in ["status", "version", "database"] {
            assert!(properties.iter().any(|p| p == field), "missing {field}");
        }
    }

    #[test]
    fn test_openapi_paths_contain_health_endpoint() {
        let openapi = ApiDoc::openapi();
        let health_path = openapi.paths.paths.get("/health").expect("/health documented");
        let health_get = health_path
            .operations
            .get(&PathItemType::Get)
            .expect("GET /health");

        assert!(health_get.responses.responses.contains_key("200"));
        assert!(health_get.responses.responses.contains_key("500"));
    }

    #[test]
    fn test_every_route_is_documented() {
        let openapi = ApiDoc::openapi();
        let expected = [
            ("/register", PathItemType::Post),
            ("/login", PathItemType::Post),
            ("/me", PathItemType::Get),
            ("/categories", PathItemType::Post),
            ("/categories/{category_id}", PathItemType::Delete),
            ("/expenses", PathItemType::Get),
            ("/expenses/{expense_id}", PathItemType::Put),
            ("/aggregation", PathItemType::Get),
            ("/api/users/{user_id}", PathItemType::Put),
            ("/tba_sio/{key}", PathItemType::Get),
            ("/users/request-password-reset", PathItemType::Post),
            ("/users/verify-reset-code", PathItemType::Post),
            ("/image/upload-receipt", PathItemType::Post),
        ];
        for (path, method) in expected {
            let item = openapi
                .paths
                .paths
                .get(path)
                .unwrap_or_else(|| panic!("{path} is not documented"));
            assert!(item.operations.contains_key(&method), "{path} lacks an operation");
        }
    }

    #[test]
    fn test_bearer_security_scheme_registered() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi = ApiDoc::openapi();
        let openapi_json = serde_json::to_string(&openapi).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("ErrorResponse"));
    }
}
