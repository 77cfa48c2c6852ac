mod temp_audio_file_test;
