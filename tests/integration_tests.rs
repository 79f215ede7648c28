//! End-to-end runs wired from configuration, with both upstreams mocked.

#[cfg(test)]
mod integration_tests {
    use cinebot::{
        CineBotError, Config, GenerationError, POSTER_PLACEHOLDER, Pipeline,
        RecommendationRequest, UNKNOWN_YEAR,
    };
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn config(llm: &MockServer, tmdb: &MockServer, extra: &[(&str, &str)]) -> Config {
        let mut vars = BTreeMap::from([
            ("LLM_PROVIDER", "deepseek".to_string()),
            ("DEEPSEEK_API_KEY", "sk-test".to_string()),
            ("LLM_BASE_URL", llm.uri()),
            ("LLM_TIMEOUT_SECS", "5".to_string()),
            ("LLM_RETRY_BASE_DELAY_SECS", "0.001".to_string()),
            ("TMDB_API_KEY", "tmdb-test".to_string()),
            ("TMDB_BASE_URL", tmdb.uri()),
            ("TMDB_IMAGE_BASE_URL", "https://img.test/w500".to_string()),
        ]);
        // Later values override the defaults above
        vars.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));
        Config::from_vars(vars.into_iter().map(|(k, v)| (k.to_string(), v)))
            .expect("Failed to load test config")
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        }))
    }

    async fn mount_tmdb(server: &MockServer, title: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("query", title))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_drishyam_scenario() {
        let llm = MockServer::start().await;
        let tmdb = MockServer::start().await;

        let content = "```json\n{\"recommendations\": [\
            {\"title\": \"Papanasam\", \"description\": \"A family man hides a crime. The police close in.\", \"reasoning\": \"Same story, same tension.\"},\
            {\"title\": \"Andhadhun\", \"description\": \"A pianist sees too much. Nothing is as it seems.\", \"reasoning\": \"Relentless twists.\"},\
            {\"title\": \"Unknown Indie\", \"description\": \"A small thriller.\", \"reasoning\": \"Tight plotting.\"}\
        ]}\n```";
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion(content))
            .expect(1)
            .mount(&llm)
            .await;

        mount_tmdb(
            &tmdb,
            "Papanasam",
            json!({"results": [{"poster_path": "/pap.jpg", "release_date": "2015-07-03"}]}),
        )
        .await;
        mount_tmdb(
            &tmdb,
            "Andhadhun",
            json!({"results": [{"poster_path": "/and.jpg", "release_date": "2018-10-05"}]}),
        )
        .await;
        mount_tmdb(&tmdb, "Unknown Indie", json!({"results": []})).await;

        let pipeline = Pipeline::from_config(&config(&llm, &tmdb, &[])).unwrap();
        let request = RecommendationRequest::new(
            "Drishyam",
            "tense plotting",
            3,
            pipeline.max_recommendations(),
        )
        .unwrap();
        let results = pipeline.run(&request).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].title, "Papanasam");
        assert_eq!(results[0].poster_reference, "https://img.test/w500/pap.jpg");
        assert_eq!(results[0].year, "2015");
        assert_eq!(results[1].title, "Andhadhun");
        assert_eq!(results[1].year, "2018");
        assert_eq!(results[2].title, "Unknown Indie");
        assert_eq!(results[2].poster_reference, POSTER_PLACEHOLDER);
        assert_eq!(results[2].year, UNKNOWN_YEAR);
    }

    #[tokio::test]
    async fn test_retries_transient_provider_failures() {
        let llm = MockServer::start().await;
        let tmdb = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&llm)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion(
                r#"{"recommendations": [{"title": "X", "description": "d", "reasoning": "r"}]}"#,
            ))
            .expect(1)
            .mount(&llm)
            .await;
        mount_tmdb(&tmdb, "X", json!({"results": []})).await;

        let pipeline = Pipeline::from_config(&config(&llm, &tmdb, &[])).unwrap();
        let request = RecommendationRequest::new("Drishyam", "tense plotting", 1, 10).unwrap();
        let results = pipeline.run(&request).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "X");
    }

    #[tokio::test]
    async fn test_exhausted_budget_reports_last_error() {
        let llm = MockServer::start().await;
        let tmdb = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(3)
            .mount(&llm)
            .await;

        let pipeline = Pipeline::from_config(&config(&llm, &tmdb, &[])).unwrap();
        let request = RecommendationRequest::new("Drishyam", "tense plotting", 1, 10).unwrap();
        let err = pipeline.run(&request).await.unwrap_err();

        match err {
            CineBotError::Generation(GenerationError::TransportExhausted { attempts, .. }) => {
                assert_eq!(attempts, 3)
            }
            other => panic!("Expected TransportExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_reply_surfaces_raw_text() {
        let llm = MockServer::start().await;
        let tmdb = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion("Sorry, I cannot help."))
            .expect(1)
            .mount(&llm)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&tmdb)
            .await;

        let pipeline = Pipeline::from_config(&config(&llm, &tmdb, &[])).unwrap();
        let request = RecommendationRequest::new("Drishyam", "tense plotting", 3, 10).unwrap();
        let err = pipeline.run(&request).await.unwrap_err();

        assert_eq!(err.kind(), "malformed_json");
        assert_eq!(err.raw_text(), Some("Sorry, I cannot help."));
    }

    #[tokio::test]
    async fn test_missing_llm_key_is_configuration_error() {
        let llm = MockServer::start().await;
        let tmdb = MockServer::start().await;

        let config = config(&llm, &tmdb, &[("LLM_PROVIDER", "openai")]);
        let err = Pipeline::from_config(&config).err().unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[tokio::test]
    async fn test_max_recommendations_from_config() {
        let llm = MockServer::start().await;
        let tmdb = MockServer::start().await;

        let pipeline =
            Pipeline::from_config(&config(&llm, &tmdb, &[("MAX_RECOMMENDATIONS", "5")])).unwrap();
        assert_eq!(pipeline.max_recommendations(), 5);
        let max = pipeline.max_recommendations();
        assert!(RecommendationRequest::new("Drishyam", "tense plotting", 6, max).is_err());
    }
}
