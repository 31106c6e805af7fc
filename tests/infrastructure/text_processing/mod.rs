mod mock_text_extractor_test;
